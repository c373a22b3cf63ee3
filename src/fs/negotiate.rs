//! Open-mode negotiation / 打开模式协商

use crate::error::{FsError, FsResult};
use crate::mode::OpenMode;
use crate::path::{dirname, is_root};

use super::directory::{Classification, DirectoryModel};

/// Check `mode` against what already lives at `path` / 检查打开模式
pub fn check_mode(existing: Classification, mode: &OpenMode, path: &str) -> FsResult<()> {
    if mode.exclusive && existing.exists() {
        return Err(FsError::FileExists(path.to_string()));
    }
    if existing.is_dir() {
        return Err(FsError::FileExpected(path.to_string()));
    }
    if !existing.exists() && !mode.create {
        return Err(FsError::ResourceNotFound(path.to_string()));
    }
    Ok(())
}

/// Parent must be a directory, then the mode must fit the target.
/// Returns the target's classification so callers skip a second lookup.
pub async fn authorize(dirs: &DirectoryModel<'_>, path: &str, mode: &OpenMode) -> FsResult<Classification> {
    let parent = dirname(path);
    if !is_root(parent) && !dirs.classify(parent).await?.is_dir() {
        return Err(FsError::ResourceNotFound(path.to_string()));
    }

    let existing = dirs.classify(path).await?;
    check_mode(existing, mode, path)?;
    Ok(existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::memory::MemoryStore;

    fn mode(s: &str) -> OpenMode {
        OpenMode::parse(s).unwrap()
    }

    #[test]
    fn test_check_mode_order() {
        use Classification::*;
        assert!(matches!(check_mode(File, &mode("x"), "f"), Err(FsError::FileExists(_))));
        // exclusive wins over the directory check
        assert!(matches!(check_mode(Directory, &mode("x"), "d"), Err(FsError::FileExists(_))));
        assert!(matches!(check_mode(Directory, &mode("r"), "d"), Err(FsError::FileExpected(_))));
        assert!(matches!(check_mode(Directory, &mode("w"), "d"), Err(FsError::FileExpected(_))));
        assert!(matches!(check_mode(NotFound, &mode("r"), "n"), Err(FsError::ResourceNotFound(_))));
        assert!(matches!(check_mode(NotFound, &mode("r+"), "n"), Err(FsError::ResourceNotFound(_))));
        assert!(check_mode(NotFound, &mode("w"), "n").is_ok());
        assert!(check_mode(NotFound, &mode("a"), "n").is_ok());
        assert!(check_mode(NotFound, &mode("x"), "n").is_ok());
        assert!(check_mode(File, &mode("r"), "f").is_ok());
        assert!(check_mode(File, &mode("a+"), "f").is_ok());
    }

    #[tokio::test]
    async fn test_parent_must_be_directory() {
        let store = MemoryStore::new();
        store.insert("plain", &b"data"[..]);
        let dirs = DirectoryModel::new(&store, ".fs_blob");

        let err = authorize(&dirs, "missing/child", &mode("w")).await.unwrap_err();
        assert_eq!(err, FsError::ResourceNotFound("missing/child".to_string()));

        let err = authorize(&dirs, "plain/child", &mode("w")).await.unwrap_err();
        assert_eq!(err, FsError::ResourceNotFound("plain/child".to_string()));

        assert_eq!(authorize(&dirs, "new", &mode("w")).await.unwrap(), Classification::NotFound);
        assert_eq!(authorize(&dirs, "plain", &mode("r")).await.unwrap(), Classification::File);
    }
}
