//! Filesystem view rooted at a sub-directory / 子目录视图
//!
//! Paths are normalized relative to the view first, so `..` cannot climb
//! above the view's root.

use bytes::Bytes;

use crate::error::FsResult;
use crate::file::ChunkedFile;
use crate::info::{Info, InfoUpdate, Namespace};
use crate::path::{join, normalize};

use super::BlobFs;

#[derive(Debug, Clone)]
pub struct SubFs {
    parent: BlobFs,
    base: String,
}

impl SubFs {
    pub(crate) fn new(parent: BlobFs, base: String) -> Self {
        Self { parent, base }
    }

    /// Path of this view inside the parent filesystem / 在父文件系统中的路径
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn parent(&self) -> &BlobFs {
        &self.parent
    }

    fn full(&self, path: &str) -> FsResult<String> {
        Ok(join(&self.base, &normalize(path)?))
    }

    pub async fn getinfo(&self, path: &str, namespaces: &[Namespace]) -> FsResult<Info> {
        self.parent.getinfo(&self.full(path)?, namespaces).await
    }

    pub async fn listdir(&self, path: &str) -> FsResult<Vec<String>> {
        self.parent.listdir(&self.full(path)?).await
    }

    pub async fn openbin(&self, path: &str, mode: &str) -> FsResult<ChunkedFile> {
        self.parent.openbin(&self.full(path)?, mode).await
    }

    pub async fn makedir(&self, path: &str, recreate: bool) -> FsResult<SubFs> {
        self.parent.makedir(&self.full(path)?, recreate).await
    }

    pub async fn makedirs(&self, path: &str, recreate: bool) -> FsResult<SubFs> {
        self.parent.makedirs(&self.full(path)?, recreate).await
    }

    pub async fn opendir(&self, path: &str) -> FsResult<SubFs> {
        self.parent.opendir(&self.full(path)?).await
    }

    pub async fn remove(&self, path: &str) -> FsResult<()> {
        self.parent.remove(&self.full(path)?).await
    }

    pub async fn removedir(&self, path: &str) -> FsResult<()> {
        self.parent.removedir(&self.full(path)?).await
    }

    pub async fn setinfo(&self, path: &str, update: &InfoUpdate) -> FsResult<()> {
        self.parent.setinfo(&self.full(path)?, update).await
    }

    pub async fn exists(&self, path: &str) -> FsResult<bool> {
        self.parent.exists(&self.full(path)?).await
    }

    pub async fn isdir(&self, path: &str) -> FsResult<bool> {
        self.parent.isdir(&self.full(path)?).await
    }

    pub async fn isfile(&self, path: &str) -> FsResult<bool> {
        self.parent.isfile(&self.full(path)?).await
    }

    pub async fn isempty(&self, path: &str) -> FsResult<bool> {
        self.parent.isempty(&self.full(path)?).await
    }

    pub async fn touch(&self, path: &str) -> FsResult<()> {
        self.parent.touch(&self.full(path)?).await
    }

    pub async fn read_bytes(&self, path: &str) -> FsResult<Bytes> {
        self.parent.read_bytes(&self.full(path)?).await
    }

    pub async fn write_bytes(&self, path: &str, data: &[u8]) -> FsResult<()> {
        self.parent.write_bytes(&self.full(path)?, data).await
    }

    pub async fn copy(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        self.parent.copy(&self.full(src)?, &self.full(dst)?, overwrite).await
    }

    pub async fn move_file(&self, src: &str, dst: &str, overwrite: bool) -> FsResult<()> {
        self.parent.move_file(&self.full(src)?, &self.full(dst)?, overwrite).await
    }

    pub fn is_read_only(&self) -> bool {
        self.parent.is_read_only()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::drivers::memory::MemoryStore;
    use crate::error::FsError;
    use crate::fs::BlobFs;

    #[tokio::test]
    async fn test_subfs_delegates_with_joined_paths() {
        let store = MemoryStore::new();
        let fs = BlobFs::from_store(Arc::new(store.clone()), ".fs_blob").await.unwrap();

        let sub = fs.makedir("projects", false).await.unwrap();
        assert_eq!(sub.base(), "projects");
        sub.write_bytes("readme.md", b"# hi").await.unwrap();
        let nested = sub.makedir("rust", false).await.unwrap();
        assert_eq!(nested.base(), "projects/rust");

        assert_eq!(sub.listdir("/").await.unwrap(), vec!["readme.md", "rust"]);
        assert_eq!(fs.read_bytes("projects/readme.md").await.unwrap(), bytes::Bytes::from("# hi"));
        assert!(store.get("projects/rust/.fs_blob").is_some());
    }

    #[tokio::test]
    async fn test_subfs_cannot_escape() {
        let store = MemoryStore::new();
        store.insert("secret", &b"s"[..]);
        let fs = BlobFs::from_store(Arc::new(store), ".fs_blob").await.unwrap();
        let sub = fs.makedir("jail", false).await.unwrap();
        assert!(matches!(sub.read_bytes("../secret").await, Err(FsError::InvalidPath(_))));
    }
}
