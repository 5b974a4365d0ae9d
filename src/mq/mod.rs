//! Ядро обмена сообщениями: Connection, Pusher, Puller, Claim.
//!
//! Connection — публичный хэндл: на каждую тему он держит не более одного
//! pusher'а (исходящий путь) и одного puller'а (входящий путь). Подписка
//! регистрирует адрес процесса в реестре; публикация находит владельца темы
//! через реестр и переиспользует либо первичного клиента хранилища, либо
//! выделенного, открытого к удалённому адресу.

pub mod claim;
pub mod connection;
pub mod consumer;

mod puller;
mod pusher;

pub use claim::{Claim, CLAIM_CAPACITY};
pub use connection::Connection;
pub use consumer::Consumer;

/// Имя MQ-драйвера; образует пространство имён ключей реестра тем.
pub const DRIVER_NAME: &str = "topiq";

/// Ключ реестра, под которым регистрируется владелец темы.
pub(crate) fn registry_name(topic: &str) -> String {
    format!("{DRIVER_NAME}/{topic}")
}

/// Имя канала хранилища для темы: тема как есть при пустом префиксе,
/// иначе `prefix/topic` без удвоенных разделителей.
pub(crate) fn channel_name(
    prefix: &str,
    topic: &str,
) -> String {
    if prefix.is_empty() {
        return topic.to_string();
    }
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        topic.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Пустой префикс — тема публикуется как есть.
    #[test]
    fn test_channel_name_without_prefix() {
        assert_eq!(channel_name("", "orders"), "orders");
    }

    /// Префикс приклеивается через одинарный разделитель.
    #[test]
    fn test_channel_name_with_prefix() {
        assert_eq!(channel_name("mq", "orders"), "mq/orders");
        assert_eq!(channel_name("mq/", "orders"), "mq/orders");
        assert_eq!(channel_name("mq", "/orders"), "mq/orders");
    }

    #[test]
    fn test_registry_name() {
        assert_eq!(registry_name("orders"), "topiq/orders");
    }
}
