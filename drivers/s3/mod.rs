//! S3 compatible object storage driver / S3对象存储驱动

pub mod config;
pub mod driver;
pub mod factory;

pub use config::S3Config;
pub use driver::S3Store;
pub use factory::S3StoreFactory;
