//! In-memory object store / 内存对象存储
//!
//! Keeps objects in a shared ordered map. Clones share the same data, so a
//! read-only view and a writable handle can observe each other.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::BackendError;
use crate::storage::{BackendResult, ChunkStream, ObjectProperties, ObjectStore};

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    metadata: HashMap<String, String>,
}

/// 内存存储
#[derive(Clone)]
pub struct MemoryStore {
    objects: Arc<RwLock<BTreeMap<String, MemoryObject>>>,
    chunk_size: usize,
    read_only: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_only: false,
        }
    }

    /// Download chunk size; small values exercise chunk boundaries / 分片大小
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Read-only view over the same objects / 只读视图
    pub fn read_only_view(&self) -> Self {
        Self {
            objects: self.objects.clone(),
            chunk_size: self.chunk_size,
            read_only: true,
        }
    }

    /// Raw keys currently stored, sorted / 当前所有键
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Raw object content / 对象内容
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.read().get(key).map(|o| o.data.clone())
    }

    /// Insert an object directly, bypassing the read-only flag / 直接写入对象
    pub fn insert(&self, key: &str, data: impl Into<Bytes>) {
        let now = Utc::now();
        self.objects.write().insert(
            key.to_string(),
            MemoryObject {
                data: data.into(),
                created: now,
                modified: now,
                metadata: HashMap::new(),
            },
        );
    }

    fn check_writable(&self, key: &str) -> BackendResult<()> {
        if self.read_only {
            return Err(BackendError::Unauthorized(format!("read-only store, key {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    async fn container_exists(&self) -> BackendResult<bool> {
        Ok(true)
    }

    async fn object_exists(&self, key: &str) -> BackendResult<bool> {
        Ok(self.objects.read().contains_key(key))
    }

    async fn get_properties(&self, key: &str) -> BackendResult<ObjectProperties> {
        let objects = self.objects.read();
        let obj = objects
            .get(key)
            .ok_or_else(|| BackendError::NotFound(key.to_string()))?;
        Ok(ObjectProperties {
            size: obj.data.len() as u64,
            created: Some(obj.created),
            modified: Some(obj.modified),
            accessed: None,
            metadata: obj.metadata.clone(),
        })
    }

    async fn list_with_prefix(&self, prefix: &str) -> BackendResult<Vec<String>> {
        let objects = self.objects.read();
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn any_with_prefix(&self, prefix: &str) -> BackendResult<bool> {
        let objects = self.objects.read();
        Ok(objects
            .range(prefix.to_string()..)
            .next()
            .map_or(false, |(k, _)| k.starts_with(prefix)))
    }

    async fn open_download_stream(&self, key: &str) -> BackendResult<ChunkStream> {
        let data = self
            .get(key)
            .ok_or_else(|| BackendError::NotFound(key.to_string()))?;

        let mut chunks: Vec<BackendResult<Bytes>> = Vec::with_capacity(data.len() / self.chunk_size + 1);
        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + self.chunk_size).min(data.len());
            chunks.push(Ok(data.slice(offset..end)));
            offset = end;
        }
        Ok(stream::iter(chunks).boxed())
    }

    async fn upload_overwrite(&self, key: &str, data: Bytes) -> BackendResult<()> {
        self.check_writable(key)?;
        let now = Utc::now();
        let mut objects = self.objects.write();
        match objects.get_mut(key) {
            // a PUT replaces custom metadata along with the content
            Some(obj) => {
                obj.data = data;
                obj.modified = now;
                obj.metadata.clear();
            }
            None => {
                objects.insert(
                    key.to_string(),
                    MemoryObject {
                        data,
                        created: now,
                        modified: now,
                        metadata: HashMap::new(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> BackendResult<()> {
        self.check_writable(key)?;
        self.objects
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(key.to_string()))
    }

    async fn set_custom_metadata(&self, key: &str, metadata: HashMap<String, String>) -> BackendResult<()> {
        self.check_writable(key)?;
        let mut objects = self.objects.write();
        let obj = objects
            .get_mut(key)
            .ok_or_else(|| BackendError::NotFound(key.to_string()))?;
        obj.metadata = metadata;
        Ok(())
    }
}
