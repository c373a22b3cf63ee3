//! Error taxonomy and backend error translation / 错误分类与后端错误转换
//!
//! Backends only ever report a [`BackendError`]; the facade and file handles
//! only ever surface an [`FsError`]. [`translate`] is the single place where
//! one becomes the other.

use thiserror::Error;

pub type FsResult<T> = std::result::Result<T, FsError>;

/// Filesystem error taxonomy / 文件系统错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("resource not found: {0:?}")]
    ResourceNotFound(String),

    #[error("path is not a file: {0:?}")]
    FileExpected(String),

    #[error("path is not a directory: {0:?}")]
    DirectoryExpected(String),

    #[error("file exists: {0:?}")]
    FileExists(String),

    #[error("destination exists: {0:?}")]
    DestinationExists(String),

    #[error("directory exists: {0:?}")]
    DirectoryExists(String),

    #[error("directory not empty: {0:?}")]
    DirectoryNotEmpty(String),

    #[error("root directory may not be removed")]
    RemoveRootError,

    #[error("permission denied")]
    PermissionDenied(Option<String>),

    #[error("invalid mode: {0:?}")]
    InvalidMode(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Construction failed (container missing, credentials rejected) / 创建失败
    #[error("unable to create filesystem: {0}")]
    CreateFailed(String),

    /// Bad URL or configuration / 配置错误
    #[error("configuration error: {0}")]
    Config(String),

    /// Anything the backend reported that has no better mapping
    #[error("filesystem error: {0}")]
    FilesystemError(String),
}

impl FsError {
    /// Path named by the error, if any / 错误涉及的路径
    pub fn path(&self) -> Option<&str> {
        match self {
            FsError::InvalidPath(p)
            | FsError::ResourceNotFound(p)
            | FsError::FileExpected(p)
            | FsError::DirectoryExpected(p)
            | FsError::FileExists(p)
            | FsError::DestinationExists(p)
            | FsError::DirectoryExists(p)
            | FsError::DirectoryNotEmpty(p) => Some(p),
            FsError::PermissionDenied(p) => p.as_deref(),
            _ => None,
        }
    }
}

/// Closed set of failures a backend may report / 后端错误码
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Classify an HTTP status code returned by a REST object store.
    /// Returns None for 2xx. / 根据HTTP状态码分类
    pub fn from_status(status: u16, context: impl Into<String>) -> Option<Self> {
        let context = context.into();
        match status {
            200..=299 => None,
            401 | 403 => Some(BackendError::Unauthorized(context)),
            404 => Some(BackendError::NotFound(context)),
            409 | 412 => Some(BackendError::AlreadyExists(context)),
            _ => Some(BackendError::Other(format!("{} (HTTP {})", context, status))),
        }
    }
}

/// Translate a backend failure into the adapter's taxonomy / 转换后端错误
pub fn translate(err: BackendError, path: &str) -> FsError {
    match err {
        BackendError::Unauthorized(_) => FsError::PermissionDenied(Some(path.to_string())),
        BackendError::AlreadyExists(_) => FsError::DestinationExists(path.to_string()),
        BackendError::NotFound(_) => FsError::ResourceNotFound(path.to_string()),
        BackendError::Other(msg) => FsError::FilesystemError(msg),
    }
}

/// Attach the path a backend call was made for / 为后端调用结果附加路径
pub trait BackendResultExt<T> {
    fn for_path(self, path: &str) -> FsResult<T>;
}

impl<T> BackendResultExt<T> for std::result::Result<T, BackendError> {
    fn for_path(self, path: &str) -> FsResult<T> {
        self.map_err(|e| {
            tracing::debug!("backend error on {:?}: {}", path, e);
            translate(e, path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate() {
        assert_eq!(
            translate(BackendError::Unauthorized("bad key".into()), "a/b"),
            FsError::PermissionDenied(Some("a/b".into()))
        );
        assert_eq!(
            translate(BackendError::AlreadyExists("x".into()), "a/b"),
            FsError::DestinationExists("a/b".into())
        );
        assert_eq!(
            translate(BackendError::NotFound("x".into()), "a/b"),
            FsError::ResourceNotFound("a/b".into())
        );
        assert_eq!(
            translate(BackendError::Other("socket closed".into()), "a/b"),
            FsError::FilesystemError("socket closed".into())
        );
    }

    #[test]
    fn test_from_status() {
        assert_eq!(BackendError::from_status(200, "k"), None);
        assert_eq!(BackendError::from_status(204, "k"), None);
        assert!(matches!(BackendError::from_status(403, "k"), Some(BackendError::Unauthorized(_))));
        assert!(matches!(BackendError::from_status(401, "k"), Some(BackendError::Unauthorized(_))));
        assert!(matches!(BackendError::from_status(404, "k"), Some(BackendError::NotFound(_))));
        assert!(matches!(BackendError::from_status(412, "k"), Some(BackendError::AlreadyExists(_))));
        match BackendError::from_status(503, "k") {
            Some(BackendError::Other(msg)) => assert!(msg.contains("503")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_for_path() {
        let r: Result<(), BackendError> = Err(BackendError::NotFound("gone".into()));
        assert_eq!(r.for_path("x"), Err(FsError::ResourceNotFound("x".into())));
    }

    #[test]
    fn test_error_path() {
        assert_eq!(FsError::FileExists("f".into()).path(), Some("f"));
        assert_eq!(FsError::PermissionDenied(None).path(), None);
        assert_eq!(FsError::RemoveRootError.path(), None);
    }
}
