use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::channel::ChannelDescriptor;
use super::media::MediaKind;
use super::message::RawMessage;
use super::snowflake::Snowflake;
use super::user::UserRecord;

/// One assembled collection result for a channel, handed to the downstream
/// aggregation pipeline. `content_id` is the stable identity the consumer
/// dedups on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedBatch {
    pub content_id: String,
    pub source: String,
    pub channel: ChannelDescriptor,
    pub date: NaiveDate,
    pub users: HashMap<Snowflake, UserRecord>,
    pub messages: Vec<RawMessage>,
}

/// One downloadable media item flattened out of a batch, for the external
/// media downloader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    pub url: String,
    pub proxy_url: Option<String>,
    pub media_type: MediaKind,
    pub filename: String,
    /// Collision-free target filename, `{sanitized-name}_{hash8}.{ext}`.
    pub unique_name: String,
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    pub user_id: Snowflake,
    pub size: Option<u64>,
}
