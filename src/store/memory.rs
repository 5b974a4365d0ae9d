use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::{Connector, Message, StoreClient, StoreSubscription, SubscribeReply};
use crate::{
    config::Options,
    error::{StoreError, StoreResult},
};

/// Ёмкость буфера каждого канала вещания.
const CHANNEL_CAPACITY: usize = 1024;

/// Общее состояние хранилища для одного адреса: pub/sub каналы и hash-ключи.
///
/// Все клиенты, открытые к одному адресу через [`MemoryConnector`], разделяют
/// один backend, поэтому публикация через выделенного клиента видна
/// подписчикам первичного — как у настоящего сетевого хранилища.
#[derive(Default)]
pub struct MemoryBackend {
    /// Каналы вещания, создаются при первом обращении.
    channels: DashMap<String, broadcast::Sender<Message>>,
    /// Hash-ключи (HSET/HGET/...).
    hashes: DashMap<String, HashMap<String, String>>,
}

impl MemoryBackend {
    fn sender(&self, channel: &str) -> broadcast::Sender<Message> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

/// Клиент хранилища в памяти.
///
/// Закрытие переводит клиента в терминальное состояние, не трогая сам
/// backend: другие клиенты того же адреса продолжают работать.
pub struct MemoryStore {
    addr: String,
    backend: Arc<MemoryBackend>,
    closed: AtomicBool,
    closed_counter: Arc<AtomicUsize>,
}

impl MemoryStore {
    fn new(
        addr: String,
        backend: Arc<MemoryBackend>,
        closed_counter: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            addr,
            backend,
            closed: AtomicBool::new(false),
            closed_counter,
        }
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::ConnectionClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn publish(
        &self,
        channel: &str,
        payload: Bytes,
    ) -> StoreResult<()> {
        self.check_open()?;
        let tx = self.backend.sender(channel);
        // Отсутствие подписчиков не ошибка: сообщение просто пропадает.
        let _ = tx.send(Message::new(channel, payload));
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> StoreResult<Box<dyn StoreSubscription>> {
        self.check_open()?;
        let rx = self.backend.sender(channel).subscribe();
        Ok(Box::new(MemorySubscription {
            channel: channel.to_string(),
            rx: Some(rx),
        }))
    }

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<()> {
        self.check_open()?;
        self.backend
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hset_nx(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<bool> {
        self.check_open()?;
        // entry держит шард-лок, так что проверка и вставка атомарны.
        let mut entry = self.backend.hashes.entry(key.to_string()).or_default();
        if entry.contains_key(field) {
            return Ok(false);
        }
        entry.insert(field.to_string(), value.to_string());
        Ok(true)
    }

    async fn hget(
        &self,
        key: &str,
        field: &str,
    ) -> StoreResult<Option<String>> {
        self.check_open()?;
        Ok(self
            .backend
            .hashes
            .get(key)
            .and_then(|fields| fields.get(field).cloned()))
    }

    async fn hdel(
        &self,
        key: &str,
        field: &str,
    ) -> StoreResult<()> {
        self.check_open()?;
        if let Some(mut fields) = self.backend.hashes.get_mut(key) {
            fields.remove(field);
        }
        Ok(())
    }

    async fn hget_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        self.check_open()?;
        Ok(self
            .backend
            .hashes
            .get(key)
            .map(|fields| fields.value().clone())
            .unwrap_or_default())
    }

    async fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.closed_counter.fetch_add(1, Ordering::Relaxed);
            debug!(addr = %self.addr, "memory store client closed");
        }
    }
}

/// Подписка на канал хранилища в памяти.
///
/// Подтверждение приходит немедленно: в памяти нет сетевого рукопожатия.
pub(crate) struct MemorySubscription {
    channel: String,
    rx: Option<broadcast::Receiver<Message>>,
}

#[async_trait]
impl StoreSubscription for MemorySubscription {
    async fn ack(&mut self) -> StoreResult<SubscribeReply> {
        Ok(SubscribeReply::Subscribed {
            channel: self.channel.clone(),
        })
    }

    async fn next(&mut self) -> Option<Message> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(channel = %self.channel, lagged = n, "subscription lagged, messages dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    async fn close(&mut self) {
        self.rx = None;
    }
}

/// Фабрика клиентов в памяти: адрес → общий backend.
///
/// Счётчики открытых и закрытых клиентов позволяют тестам проверять
/// дисциплину закрытия выделенных соединений.
#[derive(Default)]
pub struct MemoryConnector {
    backends: DashMap<String, Arc<MemoryBackend>>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend для адреса; создаётся при первом обращении.
    pub fn backend(&self, addr: &str) -> Arc<MemoryBackend> {
        self.backends
            .entry(addr.to_string())
            .or_default()
            .clone()
    }

    /// Сколько клиентов открыто через этот connector.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Сколько из них закрыто.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, options: &Options) -> StoreResult<Arc<dyn StoreClient>> {
        let backend = self.backend(&options.addr);
        self.opened.fetch_add(1, Ordering::Relaxed);
        debug!(addr = %options.addr, "memory store client opened");
        Ok(Arc::new(MemoryStore::new(
            options.addr.clone(),
            backend,
            self.closed.clone(),
        )))
    }
}
