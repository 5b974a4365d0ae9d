use thiserror::Error;

use super::StoreError;

/// Ошибка реестра сервисов.
///
/// `AlreadyExists` — отдельный, сопоставимый вариант: вызывающая сторона
/// должна уметь отличить конфликт эксклюзивной регистрации от прочих сбоев.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("registry entry already exists")]
    AlreadyExists,

    #[error("registry entry not found: {name}/{id}")]
    NotFound { name: String, id: String },

    #[error("empty registry name")]
    EmptyName,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
