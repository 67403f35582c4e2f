//! Object storage and scratch space for the relay.

pub mod local_fs;
pub mod s3;
pub mod scratch;
pub mod traits;

pub use local_fs::LocalObjectStore;
pub use s3::S3ObjectStore;
pub use scratch::ScratchDir;
pub use traits::ObjectStore;
