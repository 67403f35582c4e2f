//! Core data model for the audit log relay.
//!
//! Holds the delivery envelope, the normalized record schema, the
//! filename convention used to derive partition keys, and the shared
//! error and configuration types.

pub mod config;
pub mod error;
pub mod partition;
pub mod types;

pub use config::{Compression, RelayConfig};
pub use error::{MalformedRecord, RelayError, Result};
pub use partition::{FilenameConvention, PartitionKey};
pub use types::{Envelope, LogEvent, NormalizedRecord};
