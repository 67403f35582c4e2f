use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Framing of the source object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Back-to-back gzip members.
    #[default]
    Gzip,
    /// Uncompressed; the whole object is a single envelope.
    None,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Gzip => write!(f, "gzip"),
            Compression::None => write!(f, "none"),
        }
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(Compression::Gzip),
            "none" | "plain" => Ok(Compression::None),
            other => Err(format!("unknown compression {other:?} (expected gzip or none)")),
        }
    }
}

/// Settings for one relay process, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    pub source_bucket: String,
    pub destination_bucket: String,
    pub region: String,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub compression: Compression,
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default = "default_scratch_prefix")]
    pub scratch_prefix: String,
}

fn default_deadline_secs() -> u64 {
    120
}

fn default_scratch_prefix() -> String {
    "audit_".into()
}

impl RelayConfig {
    pub fn new(
        source_bucket: impl Into<String>,
        destination_bucket: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            destination_bucket: destination_bucket.into(),
            region: region.into(),
            ..Self::default()
        }
    }

    /// Wall-clock budget shared by the fetch and publish steps.
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_bucket.trim().is_empty() || self.destination_bucket.trim().is_empty() {
            return Err(RelayError::Config(
                "source and destination buckets must both be set".into(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(RelayError::Config("region must be set".into()));
        }
        if self.deadline_secs == 0 {
            return Err(RelayError::Config("deadline must be at least one second".into()));
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            source_bucket: String::new(),
            destination_bucket: String::new(),
            region: String::new(),
            endpoint_url: None,
            compression: Compression::default(),
            deadline_secs: default_deadline_secs(),
            scratch_prefix: default_scratch_prefix(),
        }
    }
}
