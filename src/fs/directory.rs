//! Directory emulation over a flat key space / 目录模拟
//!
//! A directory exists when its marker object exists, or implicitly when any
//! key lives under its prefix. Nothing is cached: every call asks the store.

use std::collections::BTreeSet;

use crate::error::{BackendResultExt, FsResult};
use crate::path::{dir_prefix, is_root, join};
use crate::storage::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    NotFound,
    File,
    Directory,
}

impl Classification {
    pub fn exists(self) -> bool {
        self != Classification::NotFound
    }

    pub fn is_dir(self) -> bool {
        self == Classification::Directory
    }
}

pub struct DirectoryModel<'a> {
    store: &'a dyn ObjectStore,
    marker: &'a str,
}

impl<'a> DirectoryModel<'a> {
    pub fn new(store: &'a dyn ObjectStore, marker: &'a str) -> Self {
        Self { store, marker }
    }

    /// Key of the marker object witnessing `path` / 目录占位文件的键
    pub fn marker_key(&self, path: &str) -> String {
        join(path, self.marker)
    }

    pub async fn classify(&self, path: &str) -> FsResult<Classification> {
        if is_root(path) {
            return Ok(Classification::Directory);
        }

        if self.store.object_exists(&self.marker_key(path)).await.for_path(path)? {
            return Ok(Classification::Directory);
        }

        if self.store.object_exists(path).await.for_path(path)? {
            return Ok(Classification::File);
        }

        if self.store.any_with_prefix(&dir_prefix(path)).await.for_path(path)? {
            return Ok(Classification::Directory);
        }

        Ok(Classification::NotFound)
    }

    pub async fn has_marker(&self, path: &str) -> FsResult<bool> {
        self.store.object_exists(&self.marker_key(path)).await.for_path(path)
    }

    /// Names directly under `path`, marker excluded, sorted / 列出直接子项
    pub async fn list_children(&self, path: &str) -> FsResult<Vec<String>> {
        let prefix = dir_prefix(path);
        let keys = self.store.list_with_prefix(&prefix).await.for_path(path)?;
        Ok(child_names(&prefix, &keys, self.marker))
    }

    pub async fn has_children(&self, path: &str) -> FsResult<bool> {
        Ok(!self.list_children(path).await?.is_empty())
    }
}

/// First path segment of every key below `prefix` / 提取第一段路径
fn child_names(prefix: &str, keys: &[String], marker: &str) -> Vec<String> {
    let names: BTreeSet<&str> = keys
        .iter()
        .filter_map(|key| key.strip_prefix(prefix))
        .filter_map(|rest| rest.split('/').next())
        .filter(|name| !name.is_empty() && *name != marker)
        .collect();
    names.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::memory::MemoryStore;

    const MARKER: &str = ".fs_blob";

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_child_names() {
        let k = keys(&["a/.fs_blob", "a/x.txt", "a/sub/deep/file", "a/sub/.fs_blob", "a/"]);
        assert_eq!(child_names("a/", &k, MARKER), vec!["sub", "x.txt"]);

        let root = keys(&[".fs_blob", "a/x", "b", "c/d"]);
        assert_eq!(child_names("", &root, MARKER), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_classify() {
        let store = MemoryStore::new();
        store.insert("docs/.fs_blob", &b""[..]);
        store.insert("file.txt", &b"hi"[..]);
        store.insert("implicit/child/leaf", &b"x"[..]);

        let dirs = DirectoryModel::new(&store, MARKER);
        assert_eq!(dirs.classify("").await.unwrap(), Classification::Directory);
        assert_eq!(dirs.classify("docs").await.unwrap(), Classification::Directory);
        assert_eq!(dirs.classify("file.txt").await.unwrap(), Classification::File);
        assert_eq!(dirs.classify("implicit").await.unwrap(), Classification::Directory);
        assert_eq!(dirs.classify("implicit/child").await.unwrap(), Classification::Directory);
        assert_eq!(dirs.classify("implicit/child/leaf").await.unwrap(), Classification::File);
        assert_eq!(dirs.classify("missing").await.unwrap(), Classification::NotFound);
        // "file.txt" is not a prefix of "file.txt2"
        store.insert("file.txt2", &b""[..]);
        assert_eq!(dirs.classify("file.tx").await.unwrap(), Classification::NotFound);
    }

    #[tokio::test]
    async fn test_marker_wins_over_object() {
        let store = MemoryStore::new();
        store.insert("both", &b"data"[..]);
        store.insert("both/.fs_blob", &b""[..]);
        let dirs = DirectoryModel::new(&store, MARKER);
        assert_eq!(dirs.classify("both").await.unwrap(), Classification::Directory);
    }

    #[tokio::test]
    async fn test_list_children() {
        let store = MemoryStore::new();
        store.insert("d/.fs_blob", &b""[..]);
        assert!(!dirs_has_children(&store, "d").await);
        store.insert("d/a", &b"1"[..]);
        store.insert("d/b/c", &b"2"[..]);
        let dirs = DirectoryModel::new(&store, MARKER);
        assert_eq!(dirs.list_children("d").await.unwrap(), vec!["a", "b"]);
        assert!(dirs.has_children("d").await.unwrap());
    }

    async fn dirs_has_children(store: &MemoryStore, path: &str) -> bool {
        DirectoryModel::new(store, MARKER).has_children(path).await.unwrap()
    }
}
