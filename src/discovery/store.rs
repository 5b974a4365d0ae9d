use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tracing::debug;

use super::Discovery;
use crate::{
    error::{DiscoveryError, DiscoveryResult},
    store::StoreClient,
};

/// Пространство имён ключей реестра внутри хранилища.
const REGISTRY_NAMESPACE: &str = "discovery.registry.";

/// Реестр сервисов поверх hash-примитивов клиента хранилища.
///
/// Запись `name`/`id` хранится как поле `id` hash-ключа
/// `<prefix>discovery.registry.<name>`.
pub struct StoreDiscovery {
    client: Arc<dyn StoreClient>,
    prefix: String,
}

impl StoreDiscovery {
    pub fn new(
        client: Arc<dyn StoreClient>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}{REGISTRY_NAMESPACE}{name}", self.prefix)
    }
}

#[async_trait]
impl Discovery for StoreDiscovery {
    async fn register(
        &self,
        name: &str,
        id: &str,
        value: &str,
        exclusive: bool,
    ) -> DiscoveryResult<()> {
        if name.is_empty() {
            return Err(DiscoveryError::EmptyName);
        }
        let key = self.key(name);
        if exclusive {
            if !self.client.hset_nx(&key, id, value).await? {
                return Err(DiscoveryError::AlreadyExists);
            }
        } else {
            self.client.hset(&key, id, value).await?;
        }
        debug!(name, id, value, exclusive, "registry entry written");
        Ok(())
    }

    async fn unregister(
        &self,
        name: &str,
        id: &str,
    ) -> DiscoveryResult<()> {
        if name.is_empty() {
            return Err(DiscoveryError::EmptyName);
        }
        self.client.hdel(&self.key(name), id).await?;
        debug!(name, id, "registry entry removed");
        Ok(())
    }

    async fn find(
        &self,
        name: &str,
        id: &str,
    ) -> DiscoveryResult<String> {
        if name.is_empty() {
            return Err(DiscoveryError::EmptyName);
        }
        self.client
            .hget(&self.key(name), id)
            .await?
            .ok_or_else(|| DiscoveryError::NotFound {
                name: name.to_string(),
                id: id.to_string(),
            })
    }

    async fn find_all(&self, name: &str) -> DiscoveryResult<HashMap<String, String>> {
        if name.is_empty() {
            return Err(DiscoveryError::EmptyName);
        }
        Ok(self.client.hget_all(&self.key(name)).await?)
    }
}
