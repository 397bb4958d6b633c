pub mod memory;
pub mod postgres;
pub mod repositories;
pub mod s3;

pub use memory::{MemoryBlobStore, MemoryStore};
pub use repositories::*;
pub use s3::{S3BlobStore, S3Config};
