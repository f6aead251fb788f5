//! Dispatch configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and deadline settings for one dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Default bound on a whole dispatch, retries included.
    /// A caller-supplied `timeoutMs` takes precedence.
    #[serde(
        default = "default_timeout",
        with = "super::humantime_serde::option"
    )]
    pub timeout: Option<Duration>,

    /// Additional attempts after the first one for 5xx results.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles for each subsequent retry.
    #[serde(default = "default_initial_backoff", with = "super::humantime_serde")]
    pub initial_backoff: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            initial_backoff: default_initial_backoff(),
        }
    }
}

fn default_timeout() -> Option<Duration> {
    Some(Duration::from_secs(60))
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> Duration {
    Duration::from_secs(2)
}
