use thiserror::Error;

use super::{DiscoveryError, SourceError, StoreError};

/// Верхнеуровневая ошибка MQ-соединения.
///
/// Ошибки построения (разбор источника, подтверждение подписки, setup
/// потребителя) фатальны для вызова и не оставляют частичного состояния;
/// ошибки резолюции и публикации возвращаются вызывающей стороне как есть,
/// соединение и подписки остаются рабочими.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MqError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("unexpected subscribe reply: {0}")]
    UnexpectedSubscribeReply(String),

    #[error("consumer error: {0}")]
    Consumer(String),
}

pub type MqResult<T> = Result<T, MqError>;
