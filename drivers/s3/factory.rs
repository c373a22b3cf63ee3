//! S3驱动工厂

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::config::BlobFsConfig;
use crate::storage::{ObjectStore, StoreFactory};
use super::config::S3Config;
use super::driver::S3Store;

/// S3驱动工厂
pub struct S3StoreFactory;

impl StoreFactory for S3StoreFactory {
    fn scheme(&self) -> &'static str {
        "s3"
    }

    fn create_store(&self, config: &BlobFsConfig) -> Result<Arc<dyn ObjectStore>> {
        let config = S3Config::from(config);
        if config.bucket.is_empty() {
            return Err(anyhow!("缺少 bucket 配置"));
        }
        Ok(Arc::new(S3Store::new(config)?))
    }
}
