//! topiq — тематический pub/sub поверх общего key-value хранилища
//! с динамическим обнаружением издателей.
//!
//! Подписка на тему регистрирует адрес процесса в реестре сервисов;
//! публикация находит владельца темы через реестр и переиспользует либо
//! первичное соединение с хранилищем, либо выделенное, открытое к чужому
//! адресу. Доставка — at-most-once, backpressure обеспечивает ограниченный
//! буфер доставки ([`CLAIM_CAPACITY`] сообщений на тему).

/// Connection-string parsing into structured options.
pub mod config;
/// Service registry: contract and the store-backed implementation.
pub mod discovery;
/// Common error types: source parsing, store, discovery, messaging.
pub mod error;
/// Messaging core: Connection, Pusher, Puller, Claim.
pub mod mq;
/// Store client contract and the in-memory store fabric.
pub mod store;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Connection options parsed from a source string.
pub use config::{Network, Options};
/// Registry contract and its store-backed implementation.
pub use discovery::{Discovery, StoreDiscovery};
/// Operation errors and result types.
pub use error::{
    DiscoveryError, DiscoveryResult, MqError, MqResult, SourceError, StoreError, StoreResult,
};
/// Messaging API.
pub use mq::{Claim, Connection, Consumer, CLAIM_CAPACITY, DRIVER_NAME};
/// Store client contract and the in-memory implementation.
pub use store::{
    Connector, MemoryConnector, MemoryStore, Message, StoreClient, StoreSubscription,
    SubscribeReply,
};
