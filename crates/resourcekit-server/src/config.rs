//! Serve loop configuration.

use serde::{Deserialize, Serialize};

/// Default bound on requests handled concurrently.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 64;

/// Configuration for [`ServerRuntime`](crate::server::ServerRuntime).
///
/// Deserializable so it can be embedded in an application's own config
/// file; missing fields fall back to their defaults.
///
/// ```rust
/// use resourcekit_server::RuntimeConfig;
///
/// let config: RuntimeConfig = serde_json::from_str(r#"{"max_concurrent_requests": 4}"#).unwrap();
/// assert_eq!(config.max_concurrent_requests, 4);
/// assert!(config.drain_in_flight);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum concurrent requests to process. Zero is treated as one.
    pub max_concurrent_requests: usize,
    /// Whether shutdown waits for in-flight handlers to observe
    /// cancellation and finish. When false they are aborted.
    pub drain_in_flight: bool,
}

impl RuntimeConfig {
    /// Set the concurrency bound.
    pub fn max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Set whether shutdown drains in-flight handlers.
    pub fn drain_in_flight(mut self, drain: bool) -> Self {
        self.drain_in_flight = drain;
        self
    }

    pub(crate) fn permits(&self) -> usize {
        self.max_concurrent_requests.max(1)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            drain_in_flight: true,
        }
    }
}
