// File: snowrake-common/src/models/config.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::snowflake::Snowflake;

/// Retention policy for collected messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionDetail {
    /// Keep every in-window message.
    #[default]
    Full,
    /// Keep only messages that carry downloadable media.
    MediaOnly,
}

/// Pacing and retry policy for upstream calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallPolicy {
    /// Minimum gap between consecutive calls in one fetch loop.
    #[serde(default = "default_call_gap_ms")]
    pub call_gap_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between retries when the upstream gave no advice.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Ceiling on server-advised retry-after waits. The platform sometimes
    /// returns absurd values.
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            call_gap_ms: default_call_gap_ms(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_after_secs: default_max_retry_after_secs(),
        }
    }
}

impl CallPolicy {
    pub fn call_gap(&self) -> Duration {
        Duration::from_millis(self.call_gap_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_secs)
    }
}

/// Host-provided configuration for one collection source. The engine never
/// reads files or environment variables itself; hosts embed this struct in
/// their own config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordSourceConfig {
    pub source_name: String,
    pub bot_token: String,
    pub guild_id: Snowflake,
    pub channel_ids: Vec<Snowflake>,
    #[serde(default = "default_page_size")]
    pub page_size: u8,
    #[serde(default = "default_resolver_batch_width")]
    pub resolver_batch_width: usize,
    /// Incremental polling only processes traffic newer than this window.
    #[serde(default = "default_rolling_window_secs")]
    pub rolling_window_secs: u64,
    #[serde(default)]
    pub detail: CollectionDetail,
    #[serde(default)]
    pub call_policy: CallPolicy,
}

impl DiscordSourceConfig {
    pub fn rolling_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.rolling_window_secs as i64)
    }
}

fn default_call_gap_ms() -> u64 {
    50
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_retry_after_secs() -> u64 {
    60
}

fn default_page_size() -> u8 {
    100
}

fn default_resolver_batch_width() -> usize {
    10
}

fn default_rolling_window_secs() -> u64 {
    3600
}
