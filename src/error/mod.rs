pub mod config;
pub mod discovery;
pub mod mq;
pub mod store;

// Публичный экспорт всех типов ошибок и функций из вложенных
// модулей, чтобы упростить доступ к ним из внешнего кода.
pub use config::SourceError;
pub use discovery::{DiscoveryError, DiscoveryResult};
pub use mq::{MqError, MqResult};
pub use store::{StoreError, StoreResult};
