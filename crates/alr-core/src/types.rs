use serde::{Deserialize, Serialize};

/// `messageType` of the reachability probes a log subscription emits.
pub const CONTROL_MESSAGE: &str = "CONTROL_MESSAGE";

/// One delivery unit from a log subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub message_type: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub log_group: String,
    #[serde(default)]
    pub log_stream: String,
    #[serde(default)]
    pub subscription_filters: Vec<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

impl Envelope {
    pub fn is_control(&self) -> bool {
        self.message_type == CONTROL_MESSAGE
    }
}

/// A single delivered log line, in source order within its envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub id: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub message: String,
}

/// Output schema, written as one JSON object per line.
///
/// Field order is part of the output format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(rename = "timeStamp")]
    pub timestamp: String,
    pub user: String,
    pub client: String,
    pub host: String,
    pub command: String,
    pub query: String,
}
