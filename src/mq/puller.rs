use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, warn};

use super::{
    claim::{claim_pair, ClaimSender},
    consumer::Consumer,
};
use crate::{
    error::{MqError, MqResult, StoreError},
    store::{StoreSubscription, SubscribeReply},
};

/// Хэндл подписчика одной темы; хранится в карте Connection.
///
/// Сигнал остановки одноразовый по построению: `shutdown` потребляет хэндл,
/// повторный сигнал невозможен на уровне типов.
pub(crate) struct Puller {
    topic: String,
    quit: oneshot::Sender<()>,
    handle: JoinHandle<MqResult<()>>,
}

/// Подтверждённая, но ещё не запущенная подписка.
///
/// Состояние цикла чтения, которое `start` уносит в отдельную задачу.
pub(crate) struct PullerTask {
    topic: String,
    sub: Box<dyn StoreSubscription>,
    claim: ClaimSender,
    consumer: Box<dyn Consumer>,
}

impl PullerTask {
    /// Created → Acknowledged: дожидается подтверждения подписки и
    /// синхронно прогоняет `setup` потребителя (он получает принимающую
    /// сторону claim). Любой сбой фатален — puller не создаётся.
    pub(crate) async fn new(
        mut sub: Box<dyn StoreSubscription>,
        topic: String,
        mut consumer: Box<dyn Consumer>,
    ) -> MqResult<PullerTask> {
        match sub.ack().await? {
            SubscribeReply::Subscribed { channel } => {
                debug!(topic = %topic, channel = %channel, "subscription acknowledged");
            }
            SubscribeReply::Other(kind) => {
                return Err(MqError::UnexpectedSubscribeReply(kind));
            }
        }

        let (claim, claim_rx) = claim_pair();
        consumer.setup(claim_rx).await?;

        Ok(PullerTask {
            topic,
            sub,
            claim,
            consumer,
        })
    }

    /// Acknowledged → Running: запускает цикл чтения отдельной задачей.
    pub(crate) fn start(self) -> Puller {
        let (quit_tx, quit_rx) = oneshot::channel();
        let topic = self.topic.clone();
        let handle = tokio::spawn(self.run(quit_rx));
        Puller {
            topic,
            quit: quit_tx,
            handle,
        }
    }

    /// Цикл чтения: события подписки пересылаются в claim, сигнал остановки
    /// завершает цикл. Пересылка на полном claim приостанавливается —
    /// backpressure ложится на путь доставки, не на публикатора; сигнал
    /// остановки прерывает и её (сообщение в полёте теряется, доставка
    /// at-most-once).
    async fn run(
        self,
        mut quit: oneshot::Receiver<()>,
    ) -> MqResult<()> {
        let PullerTask {
            topic,
            mut sub,
            claim,
            mut consumer,
        } = self;
        debug!(topic = %topic, "puller loop started");

        let result = loop {
            tokio::select! {
                _ = &mut quit => break Ok(()),
                event = sub.next() => match event {
                    Some(msg) => {
                        tokio::select! {
                            sent = claim.send(msg.payload) => {
                                if sent.is_err() {
                                    warn!(topic = %topic, "claim receiver dropped, stopping delivery");
                                    break Ok(());
                                }
                            }
                            _ = &mut quit => break Ok(()),
                        }
                    }
                    None => break Err(StoreError::SubscriptionLost.into()),
                },
            }
        };

        // Draining: терминальный результат уходит потребителю,
        // подписка закрывается.
        claim.finish(result);
        sub.close().await;

        // Closed: результат cleanup — итог всей задачи.
        let cleanup = consumer.cleanup().await;
        debug!(topic = %topic, "puller loop stopped");
        cleanup
    }
}

impl Puller {
    /// Running → Draining: сигналит остановку и отдаёт JoinHandle цикла,
    /// чтобы вызывающая сторона могла дождаться завершения.
    pub(crate) fn shutdown(self) -> JoinHandle<MqResult<()>> {
        let _ = self.quit.send(());
        self.handle
    }

    pub(crate) fn topic(&self) -> &str {
        &self.topic
    }
}
