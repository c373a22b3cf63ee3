use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Ordered, finite sequence of downloaded chunks / 下载分片流
pub type ChunkStream = BoxStream<'static, BackendResult<Bytes>>;

/// Object properties reported by a backend / 对象属性
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperties {
    /// Content length in bytes / 大小
    pub size: u64,
    /// Creation time, when the backend tracks it / 创建时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Last modification time / 修改时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// Last access time, when the backend tracks it / 访问时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessed: Option<DateTime<Utc>>,
    /// User-defined metadata / 自定义元数据
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Flat key-value object store (provides only primitive operations) / 对象存储接口
///
/// Keys are slash-delimited strings without a leading slash. The store has no
/// notion of directories; those are emulated by the filesystem layer.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name / 后端名称
    fn name(&self) -> &str;

    /// Whether the store was opened without a write credential / 是否只读
    fn is_read_only(&self) -> bool;

    /// Check the configured container is reachable / 检查容器是否存在
    async fn container_exists(&self) -> BackendResult<bool>;

    async fn object_exists(&self, key: &str) -> BackendResult<bool>;

    async fn get_properties(&self, key: &str) -> BackendResult<ObjectProperties>;

    /// All keys starting with `prefix`, in any order / 列出前缀下的所有键
    async fn list_with_prefix(&self, prefix: &str) -> BackendResult<Vec<String>>;

    /// Whether at least one key starts with `prefix` / 前缀下是否存在对象
    /// Backends that can stop after the first match should override this.
    async fn any_with_prefix(&self, prefix: &str) -> BackendResult<bool> {
        Ok(!self.list_with_prefix(prefix).await?.is_empty())
    }

    /// Open a streaming download of the whole object / 打开下载流
    async fn open_download_stream(&self, key: &str) -> BackendResult<ChunkStream>;

    /// Upload the object, replacing any previous content / 覆盖上传
    async fn upload_overwrite(&self, key: &str, data: Bytes) -> BackendResult<()>;

    async fn delete_object(&self, key: &str) -> BackendResult<()>;

    /// Replace the object's custom metadata / 设置自定义元数据
    async fn set_custom_metadata(&self, key: &str, metadata: HashMap<String, String>) -> BackendResult<()>;
}

pub mod manager;

pub use manager::{StoreFactory, StoreRegistry};
