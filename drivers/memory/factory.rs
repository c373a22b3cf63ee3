//! 内存存储工厂

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;

use crate::config::BlobFsConfig;
use crate::storage::{ObjectStore, StoreFactory};
use super::driver::MemoryStore;

/// Memory store factory / 内存存储工厂
///
/// Containers are created on first use and live as long as the factory, so
/// two URLs naming the same container see the same objects.
#[derive(Default)]
pub struct MemoryStoreFactory {
    containers: Mutex<HashMap<String, MemoryStore>>,
}

impl MemoryStoreFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreFactory for MemoryStoreFactory {
    fn scheme(&self) -> &'static str {
        "memory"
    }

    fn create_store(&self, config: &BlobFsConfig) -> Result<Arc<dyn ObjectStore>> {
        let store = self
            .containers
            .lock()
            .entry(config.container.clone())
            .or_insert_with(|| MemoryStore::new().with_chunk_size(config.chunk_size))
            .clone();

        let store = if config.is_read_only() {
            store.read_only_view()
        } else {
            store
        };
        Ok(Arc::new(store))
    }
}
