//! Application state shared across all handlers.

use crate::driver::Relay;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    /// Held for the duration of an invocation: one source object at a time.
    pub gate: Arc<Mutex<()>>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(relay: Arc<Relay>) -> Self {
        Self {
            relay,
            gate: Arc::new(Mutex::new(())),
            start_time: std::time::Instant::now(),
        }
    }
}
