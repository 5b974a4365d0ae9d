//! Контракт клиента хранилища и его реализация в памяти.
//!
//! Хранилище владеет собственным сетевым соединением и исполняет два рода
//! примитивов: pub/sub (PUBLISH/SUBSCRIBE) для доставки сообщений и
//! hash-примитивы (HSET/HGET/...) — на них опирается реестр сервисов.

pub mod memory;

pub use memory::{MemoryBackend, MemoryConnector, MemoryStore};

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{config::Options, error::StoreResult};

/// Сообщение, доставленное подпиской: имя канала и полезная нагрузка.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: String,
    pub payload: Bytes,
}

impl Message {
    pub fn new(
        channel: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

/// Ответ хранилища на команду подписки.
///
/// Любой вариант, кроме `Subscribed`, означает провал построения подписчика.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeReply {
    Subscribed { channel: String },
    Other(String),
}

/// Клиент хранилища.
///
/// Методы принимают `&self` и безопасны для конкурентного использования:
/// один и тот же клиент разделяют Connection и невладеющие pusher'ы.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Публикует полезную нагрузку в канал.
    async fn publish(&self, channel: &str, payload: Bytes) -> StoreResult<()>;

    /// Открывает подписку на канал.
    async fn subscribe(&self, channel: &str) -> StoreResult<Box<dyn StoreSubscription>>;

    /// HSET: записывает поле hash-ключа.
    async fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// HSETNX: записывает поле, только если его ещё нет.
    /// Возвращает `false`, если поле уже существовало.
    async fn hset_nx(&self, key: &str, field: &str, value: &str) -> StoreResult<bool>;

    /// HGET: читает поле hash-ключа.
    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    /// HDEL: удаляет поле hash-ключа.
    async fn hdel(&self, key: &str, field: &str) -> StoreResult<()>;

    /// HGETALL: читает все поля hash-ключа.
    async fn hget_all(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// Закрывает клиента; дальнейшие операции возвращают
    /// `StoreError::ConnectionClosed`.
    async fn close(&self);
}

/// Активная подписка на один канал.
#[async_trait]
pub trait StoreSubscription: Send {
    /// Подтверждение подписки; вызывается один раз до чтения событий.
    async fn ack(&mut self) -> StoreResult<SubscribeReply>;

    /// Следующее событие подписки (FIFO); `None` после закрытия.
    async fn next(&mut self) -> Option<Message>;

    /// Закрывает подписку.
    async fn close(&mut self);
}

/// Фабрика клиентов хранилища.
///
/// Через этот шов `Connection` открывает выделенные клиенты к удалённым
/// адресам, найденным в реестре, а тесты подставляют свои реализации.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, options: &Options) -> StoreResult<Arc<dyn StoreClient>>;
}
