//! S3驱动配置

use serde::{Deserialize, Serialize};

use crate::config::BlobFsConfig;

/// S3配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// 存储桶名称
    pub bucket: String,
    /// S3端点地址
    /// AWS: https://s3.{region}.amazonaws.com
    /// MinIO: http://localhost:9000
    #[serde(default)]
    pub endpoint: String,
    /// 区域
    #[serde(default = "default_region")]
    pub region: String,
    /// Access Key ID
    pub access_key_id: String,
    /// Secret Access Key（为空时匿名只读访问）
    #[serde(default)]
    pub secret_access_key: String,
    /// 强制使用路径风格（而非虚拟主机风格）
    /// MinIO等需要设置为true
    #[serde(default)]
    pub force_path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl S3Config {
    pub fn is_anonymous(&self) -> bool {
        self.secret_access_key.is_empty()
    }

    /// 实际使用的端点地址
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.is_empty() {
            format!("https://s3.{}.amazonaws.com", self.region)
        } else {
            self.endpoint.clone()
        }
    }
}

impl From<&BlobFsConfig> for S3Config {
    fn from(config: &BlobFsConfig) -> Self {
        Self {
            bucket: config.container.clone(),
            endpoint: config.resolved_endpoint().unwrap_or_default(),
            region: config.region.clone(),
            access_key_id: config.account.clone(),
            secret_access_key: config.credential.clone().unwrap_or_default(),
            force_path_style: config.force_path_style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blobfs_config() {
        let c = BlobFsConfig::new("s3", "AKID", "bucket").region("eu-central-1");
        let s3 = S3Config::from(&c);
        assert_eq!(s3.bucket, "bucket");
        assert_eq!(s3.access_key_id, "AKID");
        assert!(s3.is_anonymous());
        assert_eq!(s3.endpoint_url(), "https://s3.eu-central-1.amazonaws.com");

        let c = c.credential("secret").endpoint("http://{account}.minio.local:9000");
        let s3 = S3Config::from(&c);
        assert!(!s3.is_anonymous());
        assert_eq!(s3.endpoint_url(), "http://AKID.minio.local:9000");
    }
}
