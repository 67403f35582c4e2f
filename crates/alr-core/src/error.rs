use thiserror::Error;

/// Why a single delimited message could not become a normalized record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("expected at least {required} fields, found {found}")]
    TooFewFields { found: usize, required: usize },
    #[error("query is not wrapped in a matching delimiter: {query:?}")]
    UnwrappedQuery { query: String },
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Fetch failed for {key}: {reason}")]
    Fetch { key: String, reason: String },
    #[error("Decompression error in frame {frame}: {source}")]
    Decompression {
        frame: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("Decode error in frame {frame}: {source}")]
    Decode {
        frame: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed record in frame {frame}, event {event}: {source}")]
    MalformedRecord {
        frame: usize,
        event: usize,
        #[source]
        source: MalformedRecord,
    },
    #[error("Filename {filename:?} does not follow convention {convention}: {reason}")]
    FilenameConvention {
        filename: String,
        convention: String,
        reason: String,
    },
    #[error("Publish failed for {key}: {reason}")]
    Publish { key: String, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelayError {
    /// Short machine-readable label, used in logs and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Decompression { .. } => "decompression",
            Self::Decode { .. } => "decode",
            Self::MalformedRecord { .. } => "malformed_record",
            Self::FilenameConvention { .. } => "filename_convention",
            Self::Publish { .. } => "publish",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Other(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
