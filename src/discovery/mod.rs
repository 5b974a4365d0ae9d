//! Реестр сервисов: контракт и реализация поверх клиента хранилища.
//!
//! Реестр отображает логическое имя и идентификатор участника в строку
//! значения (для MQ — адрес процесса, владеющего темой). Эксклюзивная
//! регистрация завершается отличимой ошибкой `AlreadyExists`, если
//! идентификатор уже занят.

pub mod store;

pub use store::StoreDiscovery;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::DiscoveryResult;

/// Контракт реестра сервисов.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Регистрирует значение под `name`/`id`.
    ///
    /// При `exclusive == true` занятый `id` — ошибка
    /// [`DiscoveryError::AlreadyExists`](crate::error::DiscoveryError);
    /// иначе запись перезаписывается (последний пишущий побеждает).
    async fn register(
        &self,
        name: &str,
        id: &str,
        value: &str,
        exclusive: bool,
    ) -> DiscoveryResult<()>;

    /// Удаляет запись `name`/`id`.
    async fn unregister(&self, name: &str, id: &str) -> DiscoveryResult<()>;

    /// Находит значение записи `name`/`id`.
    async fn find(&self, name: &str, id: &str) -> DiscoveryResult<String>;

    /// Возвращает все записи по имени: id → значение.
    async fn find_all(&self, name: &str) -> DiscoveryResult<HashMap<String, String>>;
}
