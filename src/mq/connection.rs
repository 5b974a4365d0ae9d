use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{
    channel_name,
    consumer::Consumer,
    puller::{Puller, PullerTask},
    pusher::Pusher,
    registry_name,
};
use crate::{
    config::Options,
    discovery::Discovery,
    error::MqResult,
    store::{Connector, StoreClient},
};

/// Верхнеуровневое MQ-соединение.
///
/// Держит не более одного живого pusher'а и одного живого puller'а на тему.
/// Карта pusher'ов читается часто и мутируется редко — RwLock; карта
/// puller'ов мутируется под сетевые вызовы реестра — Mutex, чтобы
/// регистрация не гонялась с `close`.
pub struct Connection {
    options: Options,
    client: Arc<dyn StoreClient>,
    discovery: Arc<dyn Discovery>,
    connector: Arc<dyn Connector>,
    pushers: RwLock<HashMap<String, Arc<Pusher>>>,
    pullers: Mutex<HashMap<String, Puller>>,
}

impl Connection {
    /// Открывает соединение: разбирает строку источника и поднимает
    /// первичного клиента хранилища через connector.
    pub async fn open(
        source: &str,
        connector: Arc<dyn Connector>,
        discovery: Arc<dyn Discovery>,
    ) -> MqResult<Connection> {
        let options = Options::parse(source)?;
        let client = connector.connect(&options).await?;
        info!(addr = %options.addr, "mq connection opened");
        Ok(Connection {
            options,
            client,
            discovery,
            connector,
            pushers: RwLock::new(HashMap::new()),
            pullers: Mutex::new(HashMap::new()),
        })
    }

    /// Параметры соединения.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Подписывает потребителя на тему с неэксклюзивной регистрацией
    /// владельца (последний пишущий побеждает — поведение по умолчанию).
    pub async fn subscribe<C: Consumer>(
        &self,
        topic: &str,
        consumer: C,
    ) -> MqResult<()> {
        self.subscribe_with(topic, consumer, false).await
    }

    /// Подписывает потребителя на тему.
    ///
    /// Идемпотентна: существующая подписка возвращает `Ok(())` без побочных
    /// эффектов. Иначе открывает подписку на канал темы, строит puller
    /// (подтверждение + setup потребителя), регистрирует адрес процесса
    /// под ключом `topiq/<тема>` и запускает цикл чтения. Сбой на любом
    /// шаге проваливает весь вызов, puller не сохраняется.
    ///
    /// При `exclusive == true` занятая другим процессом запись владельца
    /// всплывает как `DiscoveryError::AlreadyExists`, а не перезаписывается.
    pub async fn subscribe_with<C: Consumer>(
        &self,
        topic: &str,
        consumer: C,
        exclusive: bool,
    ) -> MqResult<()> {
        let mut pullers = self.pullers.lock().await;
        if pullers.contains_key(topic) {
            return Ok(());
        }

        let channel = channel_name(&self.options.prefix, topic);
        let sub = self.client.subscribe(&channel).await?;
        let task = PullerTask::new(sub, topic.to_string(), Box::new(consumer)).await?;

        self.discovery
            .register(&registry_name(topic), "0", &self.options.addr, exclusive)
            .await?;

        debug!(topic, channel = %channel, "subscribed");
        pullers.insert(topic.to_string(), task.start());
        Ok(())
    }

    /// Публикует полезную нагрузку в тему; ошибка резолюции или публикации
    /// возвращается вызывающей стороне как есть.
    pub async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
    ) -> MqResult<()> {
        let pusher = self.get_pusher(topic).await?;
        Ok(pusher.publish(payload).await?)
    }

    /// Проверяет достижимость темы: резолюция pusher'а без публикации.
    pub async fn ping(&self, topic: &str) -> MqResult<()> {
        self.get_pusher(topic).await.map(|_| ())
    }

    /// Возвращает pusher темы, создавая его при необходимости.
    ///
    /// Быстрый путь — поиск в кеше под читающим локом. Медленный путь:
    /// адрес владельца темы берётся из реестра; свой адрес — pusher поверх
    /// первичного клиента (невладеющий), чужой — выделенный клиент к
    /// найденному адресу (владеющий). Построенный кандидат перепроверяется
    /// под пишущим локом: конкурентно установленный pusher побеждает, а
    /// проигравший закрывается, если владеет соединением. Лок не
    /// удерживается через сетевые вызовы.
    async fn get_pusher(&self, topic: &str) -> MqResult<Arc<Pusher>> {
        if let Some(pusher) = self.pushers.read().await.get(topic) {
            return Ok(pusher.clone());
        }

        let value = self.discovery.find(&registry_name(topic), "0").await?;
        let pusher = if value == self.options.addr {
            Pusher::new(
                channel_name(&self.options.prefix, topic),
                self.client.clone(),
                false,
            )
        } else {
            // Зарегистрированное значение — строка источника удалённого
            // владельца; префикс канала берётся из НЕЁ.
            let remote = Options::parse(&value)?;
            let client = self.connector.connect(&remote).await?;
            debug!(topic, addr = %remote.addr, "opened dedicated store client for remote topic owner");
            Pusher::new(channel_name(&remote.prefix, topic), client, true)
        };
        let pusher = Arc::new(pusher);

        let mut pushers = self.pushers.write().await;
        if let Some(winner) = pushers.get(topic) {
            let winner = winner.clone();
            drop(pushers);
            // Проигравший дубликат: выделенное соединение закрывается,
            // общее остаётся жить.
            pusher.shutdown().await;
            return Ok(winner);
        }
        pushers.insert(topic.to_string(), pusher.clone());
        Ok(pusher)
    }

    /// Закрывает соединение: сигналит остановку всем puller'ам, гасит все
    /// pusher'ы (выделенные клиенты закрываются, общий первичный — нет) и
    /// дожидается завершения циклов чтения. Ошибки детей не агрегируются —
    /// закрытие best-effort, сбои уходят в лог. После close соединение
    /// считается израсходованным.
    pub async fn close(&self) {
        let mut handles = Vec::new();
        {
            let mut pullers = self.pullers.lock().await;
            for (_, puller) in pullers.drain() {
                debug!(topic = %puller.topic(), "signalling puller shutdown");
                handles.push(puller.shutdown());
            }
        }
        {
            let mut pushers = self.pushers.write().await;
            for (_, pusher) in pushers.drain() {
                pusher.shutdown().await;
            }
        }
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "puller finished with error"),
                Err(err) => warn!(error = %err, "puller task join failed"),
            }
        }
        info!(addr = %self.options.addr, "mq connection closed");
    }
}
