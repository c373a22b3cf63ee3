use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

use super::ObjectStore;
use crate::config::BlobFsConfig;
use crate::error::{FsError, FsResult};

/// Store factory trait / 存储工厂 trait
pub trait StoreFactory: Send + Sync {
    /// URL scheme handled by this factory / 处理的URL协议
    fn scheme(&self) -> &'static str;

    /// Create a store instance; does not contact the backend / 创建存储实例
    fn create_store(&self, config: &BlobFsConfig) -> Result<Arc<dyn ObjectStore>>;
}

/// Store registry (maps URL schemes to factories) / 存储注册表
#[derive(Clone, Default)]
pub struct StoreRegistry {
    factories: Arc<RwLock<HashMap<String, Arc<dyn StoreFactory>>>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in driver / 包含所有内置驱动的注册表
    pub async fn with_builtin() -> Self {
        let registry = Self::new();
        crate::drivers::register_all(&registry).await;
        registry
    }

    /// Register store factory / 注册存储工厂
    pub async fn register_factory(&self, factory: Box<dyn StoreFactory>) {
        let scheme = factory.scheme().to_string();
        let mut factories = self.factories.write().await;
        factories.insert(scheme.clone(), Arc::from(factory));
        tracing::debug!("Store factory registered: {}", scheme);
    }

    /// List all registered schemes / 列出所有协议
    pub async fn schemes(&self) -> Vec<String> {
        let factories = self.factories.read().await;
        let mut schemes: Vec<String> = factories.keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Create a store for the given configuration / 创建存储实例
    pub async fn create_store(&self, config: &BlobFsConfig) -> FsResult<Arc<dyn ObjectStore>> {
        let factory = {
            let factories = self.factories.read().await;
            factories
                .get(&config.scheme)
                .cloned()
                .ok_or_else(|| FsError::Config(format!("unsupported scheme: {}", config.scheme)))?
        };

        match factory.create_store(config) {
            Ok(store) => {
                tracing::info!(
                    "Store created: {}://{}@{} (read_only={})",
                    config.scheme,
                    config.account,
                    config.container,
                    store.is_read_only()
                );
                Ok(store)
            }
            Err(e) => {
                tracing::error!("Store creation failed: {}://{} - {:#}", config.scheme, config.container, e);
                Err(FsError::CreateFailed(format!("{:#}", e)))
            }
        }
    }

    /// Create a store from a JSON configuration / 从JSON配置创建存储
    pub async fn create_store_from_value(&self, config: serde_json::Value) -> FsResult<Arc<dyn ObjectStore>> {
        let config: BlobFsConfig = serde_json::from_value(config)
            .map_err(|e| FsError::Config(format!("invalid configuration: {}", e)))?;
        self.create_store(&config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_schemes() {
        let registry = StoreRegistry::with_builtin().await;
        assert_eq!(registry.schemes().await, vec!["memory", "s3"]);
    }

    #[tokio::test]
    async fn test_unknown_scheme() {
        let registry = StoreRegistry::with_builtin().await;
        let config = BlobFsConfig::new("gopher", "acct", "c");
        assert!(matches!(registry.create_store(&config).await, Err(FsError::Config(_))));
    }

    #[tokio::test]
    async fn test_memory_containers_are_shared() {
        let registry = StoreRegistry::with_builtin().await;
        let config = BlobFsConfig::new("memory", "acct", "shared").credential("k");
        let a = registry.create_store(&config).await.unwrap();
        let b = registry
            .create_store_from_value(serde_json::json!({
                "scheme": "memory",
                "account": "acct",
                "container": "shared",
            }))
            .await
            .unwrap();
        assert!(!a.is_read_only());
        assert!(b.is_read_only());
        a.upload_overwrite("k", bytes::Bytes::from("v")).await.unwrap();
        assert!(b.object_exists("k").await.unwrap());
    }
}
