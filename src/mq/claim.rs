use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::error::MqResult;

/// Ёмкость буфера доставки.
///
/// Это единственный механизм backpressure в системе: заполненный буфер
/// приостанавливает пересылку в цикле чтения, а не роняет сообщения.
/// Обратного сигнала исходному публикатору нет.
pub const CLAIM_CAPACITY: usize = 64;

/// Принимающая сторона доставки одной темы.
///
/// Передаётся потребителю в `setup`; потребитель вычитывает сообщения через
/// [`recv`](Claim::recv) до `None`, затем забирает итог подписки через
/// [`finish`](Claim::finish).
pub struct Claim {
    messages: mpsc::Receiver<Bytes>,
    done: oneshot::Receiver<MqResult<()>>,
}

/// Отправляющая сторона: ею владеет цикл чтения puller'а.
pub(crate) struct ClaimSender {
    messages: mpsc::Sender<Bytes>,
    done: oneshot::Sender<MqResult<()>>,
}

/// Создаёт связанную пару сторон доставки.
pub(crate) fn claim_pair() -> (ClaimSender, Claim) {
    let (msg_tx, msg_rx) = mpsc::channel(CLAIM_CAPACITY);
    let (done_tx, done_rx) = oneshot::channel();
    (
        ClaimSender {
            messages: msg_tx,
            done: done_tx,
        },
        Claim {
            messages: msg_rx,
            done: done_rx,
        },
    )
}

impl Claim {
    /// Следующее сообщение темы в порядке публикации; `None`, когда цикл
    /// чтения завершён и буфер исчерпан.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.messages.recv().await
    }

    /// Итоговый результат подписки после остановки цикла чтения.
    pub async fn finish(self) -> MqResult<()> {
        drop(self.messages);
        self.done.await.unwrap_or(Ok(()))
    }
}

impl ClaimSender {
    /// Пересылает сообщение потребителю; приостанавливается на полном
    /// буфере. `Err` означает, что потребитель бросил свою сторону.
    pub(crate) async fn send(&self, payload: Bytes) -> Result<(), mpsc::error::SendError<Bytes>> {
        self.messages.send(payload).await
    }

    /// Отправляет терминальный результат и закрывает канал сообщений.
    pub(crate) fn finish(
        self,
        result: MqResult<()>,
    ) {
        drop(self.messages);
        let _ = self.done.send(result);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::error::{MqError, StoreError};

    /// Сообщения проходят в порядке отправки (FIFO).
    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, mut claim) = claim_pair();
        for payload in ["m1", "m2", "m3"] {
            tx.send(Bytes::from(payload)).await.unwrap();
        }
        assert_eq!(claim.recv().await.unwrap(), Bytes::from("m1"));
        assert_eq!(claim.recv().await.unwrap(), Bytes::from("m2"));
        assert_eq!(claim.recv().await.unwrap(), Bytes::from("m3"));
    }

    /// 65-я отправка при непотребляющем читателе приостанавливается
    /// и продолжается, как только читатель забирает одно сообщение.
    #[tokio::test]
    async fn test_backpressure_at_capacity() {
        let (tx, mut claim) = claim_pair();
        for i in 0..CLAIM_CAPACITY {
            tx.send(Bytes::from(i.to_string())).await.unwrap();
        }

        // Буфер полон: 65-я отправка не завершается.
        let blocked = timeout(Duration::from_millis(50), tx.send(Bytes::from("overflow"))).await;
        assert!(blocked.is_err(), "send over capacity must suspend");

        // Читатель освобождает слот — отправка проходит.
        assert_eq!(claim.recv().await.unwrap(), Bytes::from("0"));
        timeout(Duration::from_millis(50), tx.send(Bytes::from("overflow")))
            .await
            .expect("send must proceed after one recv")
            .unwrap();
    }

    /// После терминального результата recv() возвращает None,
    /// а finish() отдаёт сам результат.
    #[tokio::test]
    async fn test_finish_normal_completion() {
        let (tx, mut claim) = claim_pair();
        tx.send(Bytes::from("last")).await.unwrap();
        tx.finish(Ok(()));

        assert_eq!(claim.recv().await.unwrap(), Bytes::from("last"));
        assert!(claim.recv().await.is_none());
        assert!(claim.finish().await.is_ok());
    }

    /// Терминальная ошибка доносится до потребителя.
    #[tokio::test]
    async fn test_finish_with_error() {
        let (tx, claim) = claim_pair();
        tx.finish(Err(StoreError::SubscriptionLost.into()));
        assert_eq!(
            claim.finish().await.unwrap_err(),
            MqError::Store(StoreError::SubscriptionLost)
        );
    }
}
