use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::{error::StoreResult, store::StoreClient};

/// Исходящий путь одной темы: разрешённое имя канала плюс клиент хранилища.
///
/// `owned == true` — клиент открыт специально под удалённый адрес владельца
/// темы и закрывается вместе с pusher'ом; `owned == false` — клиент общий
/// (первичный клиент Connection), его жизненным циклом pusher не управляет.
pub(crate) struct Pusher {
    channel: String,
    client: Arc<dyn StoreClient>,
    owned: bool,
}

impl Pusher {
    pub(crate) fn new(
        channel: String,
        client: Arc<dyn StoreClient>,
        owned: bool,
    ) -> Self {
        Self {
            channel,
            client,
            owned,
        }
    }

    /// Публикует полезную нагрузку; ошибка хранилища возвращается как есть.
    pub(crate) async fn publish(&self, payload: Bytes) -> StoreResult<()> {
        self.client.publish(&self.channel, payload).await
    }

    /// Закрывает клиента хранилища, только если pusher им владеет.
    pub(crate) async fn shutdown(&self) {
        if self.owned {
            debug!(channel = %self.channel, "closing dedicated store client");
            self.client.close().await;
        }
    }
}
