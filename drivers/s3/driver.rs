//! S3驱动核心实现
//!
//! 设计原则：
//! - 只提供原语（exists, head, list, stream download, put, delete）
//! - 关闭 fail-on-err，由状态码统一映射到 BackendError
//! - 无写入凭证时使用匿名凭证，只读

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::Region;

use crate::error::BackendError;
use crate::storage::{BackendResult, ChunkStream, ObjectProperties, ObjectStore};
use super::config::S3Config;

/// S3驱动
pub struct S3Store {
    config: S3Config,
    bucket: Box<Bucket>,
}

impl S3Store {
    /// 创建新的S3驱动实例
    pub fn new(config: S3Config) -> Result<Self> {
        let bucket = Self::create_bucket(&config)?;
        Ok(Self { config, bucket })
    }

    /// 创建S3 Bucket客户端
    fn create_bucket(config: &S3Config) -> Result<Box<Bucket>> {
        let credentials = if config.is_anonymous() {
            Credentials::anonymous()
        } else {
            Credentials::new(
                Some(&config.access_key_id),
                Some(&config.secret_access_key),
                None,
                None,
                None,
            )
        };
        let credentials = credentials.map_err(|e| anyhow!("创建S3凭证失败: {}", e))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint_url(),
        };

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| anyhow!("创建S3 Bucket失败: {}", e))?;

        let bucket = if config.force_path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(bucket)
    }

    fn check_writable(&self, key: &str) -> BackendResult<()> {
        if self.config.is_anonymous() {
            return Err(BackendError::Unauthorized(format!("匿名访问不可写入: {}", key)));
        }
        Ok(())
    }
}

/// 状态码检查
fn check_status(status: u16, context: &str) -> BackendResult<()> {
    match BackendError::from_status(status, context) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// 将 rust-s3 错误映射为 BackendError
fn s3_error(err: S3Error, context: &str) -> BackendError {
    match err {
        S3Error::HttpFailWithBody(status, body) => {
            let detail = format!("{}: {}", context, body);
            BackendError::from_status(status, detail.clone()).unwrap_or(BackendError::Other(detail))
        }
        other => BackendError::Other(format!("{}: {}", context, other)),
    }
}

/// 解析 Last-Modified（RFC 2822）
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// 元数据键只允许 token 字符，值只允许可见ASCII
fn validate_metadata(metadata: &HashMap<String, String>) -> BackendResult<()> {
    for (k, v) in metadata {
        let key_ok = !k.is_empty() && k.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        let value_ok = v.chars().all(|c| c.is_ascii_graphic() || c == ' ');
        if !key_ok || !value_ok {
            return Err(BackendError::Other(format!("非法的元数据: {}={}", k, v)));
        }
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &str {
        "s3"
    }

    fn is_read_only(&self) -> bool {
        self.config.is_anonymous()
    }

    async fn container_exists(&self) -> BackendResult<bool> {
        let (_, status) = self
            .bucket
            .list_page(String::new(), None, None, None, Some(1))
            .await
            .map_err(|e| s3_error(e, &self.config.bucket))?;
        match status {
            200..=299 => Ok(true),
            404 => Ok(false),
            code => Err(BackendError::from_status(code, self.config.bucket.clone())
                .unwrap_or_else(|| BackendError::Other(format!("HTTP {}", code)))),
        }
    }

    async fn object_exists(&self, key: &str) -> BackendResult<bool> {
        let (_, status) = self
            .bucket
            .head_object(key)
            .await
            .map_err(|e| s3_error(e, key))?;
        match status {
            404 => Ok(false),
            code => check_status(code, key).map(|_| true),
        }
    }

    async fn get_properties(&self, key: &str) -> BackendResult<ObjectProperties> {
        let (head, status) = self
            .bucket
            .head_object(key)
            .await
            .map_err(|e| s3_error(e, key))?;
        check_status(status, key)?;

        Ok(ObjectProperties {
            size: head.content_length.unwrap_or(0).max(0) as u64,
            created: None,
            modified: head.last_modified.as_deref().and_then(parse_http_date),
            accessed: None,
            metadata: head.metadata.unwrap_or_default(),
        })
    }

    async fn list_with_prefix(&self, prefix: &str) -> BackendResult<Vec<String>> {
        let results = self
            .bucket
            .list(prefix.to_string(), None)
            .await
            .map_err(|e| s3_error(e, prefix))?;

        Ok(results
            .into_iter()
            .flat_map(|r| r.contents.into_iter().map(|obj| obj.key))
            .collect())
    }

    async fn any_with_prefix(&self, prefix: &str) -> BackendResult<bool> {
        let (page, status) = self
            .bucket
            .list_page(prefix.to_string(), None, None, None, Some(1))
            .await
            .map_err(|e| s3_error(e, prefix))?;
        check_status(status, prefix)?;
        Ok(!page.contents.is_empty())
    }

    async fn open_download_stream(&self, key: &str) -> BackendResult<ChunkStream> {
        let response = self
            .bucket
            .get_object_stream(key)
            .await
            .map_err(|e| s3_error(e, key))?;
        check_status(response.status_code, key)?;

        tracing::debug!("S3流式下载: key={}", key);

        // 逐片读取，错误原样映射
        let context = key.to_string();
        let chunks = stream::unfold(response, |mut response| async move {
            let item = response.bytes().next().await?;
            Some((item, response))
        })
        .map(move |item| item.map_err(|e| s3_error(e, &context)));

        Ok(chunks.boxed())
    }

    async fn upload_overwrite(&self, key: &str, data: Bytes) -> BackendResult<()> {
        self.check_writable(key)?;
        tracing::debug!("S3上传: key={}, size={}", key, data.len());
        let response = self
            .bucket
            .put_object(key, &data)
            .await
            .map_err(|e| s3_error(e, key))?;
        check_status(response.status_code(), key)
    }

    async fn delete_object(&self, key: &str) -> BackendResult<()> {
        self.check_writable(key)?;
        tracing::debug!("S3删除: key={}", key);
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| s3_error(e, key))?;
        check_status(response.status_code(), key)
    }

    /// S3 没有单独修改元数据的接口：原地 CopyObject 并 REPLACE 元数据
    async fn set_custom_metadata(&self, key: &str, metadata: HashMap<String, String>) -> BackendResult<()> {
        self.check_writable(key)?;
        validate_metadata(&metadata)?;

        let mut bucket = (*self.bucket).clone();
        bucket.add_header("x-amz-metadata-directive", "REPLACE");
        for (k, v) in &metadata {
            bucket.add_header(&format!("x-amz-meta-{}", k.to_ascii_lowercase()), v);
        }

        // copy_object_internal的from参数需要URL编码（中文等非ASCII字符）
        let encoded_src = urlencoding::encode(key);
        tracing::debug!("S3设置元数据: key={}, entries={}", key, metadata.len());

        let status = bucket
            .copy_object_internal(&*encoded_src, key)
            .await
            .map_err(|e| s3_error(e, key))?;
        check_status(status, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_date() {
        let t = parse_http_date("Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        assert_eq!(t.timestamp(), 1_445_412_480);
        assert!(parse_http_date("yesterday").is_none());
    }

    #[test]
    fn test_validate_metadata() {
        let ok = HashMap::from([("last_modified".to_string(), "1700000000".to_string())]);
        assert!(validate_metadata(&ok).is_ok());
        let bad_key = HashMap::from([("bad key".to_string(), "v".to_string())]);
        assert!(validate_metadata(&bad_key).is_err());
        let bad_value = HashMap::from([("k".to_string(), "line\nbreak".to_string())]);
        assert!(validate_metadata(&bad_value).is_err());
    }

    #[test]
    fn test_s3_error_mapping() {
        let e = s3_error(S3Error::HttpFailWithBody(404, "NoSuchKey".to_string()), "a/b");
        assert!(matches!(e, BackendError::NotFound(_)));
        let e = s3_error(S3Error::HttpFailWithBody(403, "AccessDenied".to_string()), "a/b");
        assert!(matches!(e, BackendError::Unauthorized(_)));
        let e = s3_error(S3Error::HttpFailWithBody(500, "oops".to_string()), "a/b");
        assert!(matches!(e, BackendError::Other(_)));
    }

    #[test]
    fn test_anonymous_store_is_read_only() {
        let config = S3Config {
            bucket: "public".to_string(),
            endpoint: "http://localhost:9000".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: "anyone".to_string(),
            secret_access_key: String::new(),
            force_path_style: true,
        };
        let store = S3Store::new(config).unwrap();
        assert!(store.is_read_only());
        assert!(matches!(store.check_writable("k"), Err(BackendError::Unauthorized(_))));
    }
}
