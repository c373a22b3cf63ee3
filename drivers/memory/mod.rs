//! In-memory object store driver / 内存存储驱动

pub mod driver;
pub mod factory;

pub use driver::MemoryStore;
pub use factory::MemoryStoreFactory;
