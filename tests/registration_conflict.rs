use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use topiq::{
    Claim, Connection, Connector, Consumer, Discovery, DiscoveryError, MemoryConnector, MqError,
    MqResult, Options, StoreDiscovery,
};

struct NoopConsumer {
    cleanups: Arc<AtomicUsize>,
    claim: Arc<Mutex<Option<Claim>>>,
}

#[async_trait]
impl Consumer for NoopConsumer {
    async fn setup(&mut self, claim: Claim) -> MqResult<()> {
        *self.claim.lock().await = Some(claim);
        Ok(())
    }

    async fn cleanup(&mut self) -> MqResult<()> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn consumer() -> (NoopConsumer, Arc<Mutex<Option<Claim>>>, Arc<AtomicUsize>) {
    let claim = Arc::new(Mutex::new(None));
    let cleanups = Arc::new(AtomicUsize::new(0));
    (
        NoopConsumer {
            cleanups: cleanups.clone(),
            claim: claim.clone(),
        },
        claim,
        cleanups,
    )
}

async fn new_discovery() -> Arc<StoreDiscovery> {
    let connector = MemoryConnector::new();
    let options = Options::parse("127.0.0.1:6500").unwrap();
    let client = connector.connect(&options).await.unwrap();
    Arc::new(StoreDiscovery::new(client, ""))
}

/// Эксклюзивная подписка на тему, уже зарегистрированную другим процессом,
/// всплывает как AlreadyExists и не перезаписывает запись владельца;
/// puller не сохраняется.
#[tokio::test]
async fn test_exclusive_subscribe_surfaces_conflict() {
    let connector = Arc::new(MemoryConnector::new());
    let discovery = new_discovery().await;

    // Запись владельца от «другого процесса».
    discovery
        .register("topiq/orders", "0", "127.0.0.1:7001", false)
        .await
        .unwrap();

    let conn = Connection::open("127.0.0.1:7002", connector, discovery.clone())
        .await
        .unwrap();

    let (c, ..) = consumer();
    let err = conn.subscribe_with("orders", c, true).await.unwrap_err();
    assert_eq!(err, MqError::Discovery(DiscoveryError::AlreadyExists));

    // Запись владельца не тронута.
    assert_eq!(
        discovery.find("topiq/orders", "0").await.unwrap(),
        "127.0.0.1:7001"
    );

    // Провал регистрации не оставил puller'а: обычная подписка проходит
    // и перезаписывает владельца (последний пишущий побеждает).
    let (c, claim, _) = consumer();
    conn.subscribe("orders", c).await.unwrap();
    assert_eq!(
        discovery.find("topiq/orders", "0").await.unwrap(),
        "127.0.0.1:7002"
    );

    conn.publish("orders", Bytes::from_static(b"mine")).await.unwrap();
    let mut claim = claim.lock().await.take().unwrap();
    assert_eq!(claim.recv().await.unwrap(), Bytes::from_static(b"mine"));

    conn.close().await;
}

/// Первая эксклюзивная подписка проходит; конкурент из другого процесса
/// получает конфликт, а сам владелец при повторе — идемпотентный Ok.
#[tokio::test]
async fn test_exclusive_subscribe_first_wins() {
    let connector = Arc::new(MemoryConnector::new());
    let discovery = new_discovery().await;

    let owner = Connection::open("127.0.0.1:7001", connector.clone(), discovery.clone())
        .await
        .unwrap();
    let (c, _, cleanups) = consumer();
    owner.subscribe_with("orders", c, true).await.unwrap();

    // Повтор на том же соединении — идемпотентность, не конфликт.
    let (c2, ..) = consumer();
    owner.subscribe_with("orders", c2, true).await.unwrap();

    let rival = Connection::open("127.0.0.1:7002", connector, discovery)
        .await
        .unwrap();
    let (c3, ..) = consumer();
    let err = rival.subscribe_with("orders", c3, true).await.unwrap_err();
    assert_eq!(err, MqError::Discovery(DiscoveryError::AlreadyExists));

    owner.close().await;
    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
}
