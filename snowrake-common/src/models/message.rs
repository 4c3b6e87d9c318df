use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::{MediaAttachment, MediaEmbed, MediaSticker};
use super::snowflake::Snowflake;

/// One reaction emoji and how many users added it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionTally {
    pub emoji: String,
    pub count: u64,
}

/// Partial author object embedded in every fetched message payload.
/// Always available, even when the full member lookup fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorStub {
    pub user_id: Snowflake,
    pub username: String,
    pub display_name: Option<String>,
    pub bot: bool,
}

/// One collected message, normalized from the wire payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub message_id: Snowflake,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub author: AuthorStub,
    pub content: String,
    pub reply_to: Option<Snowflake>,
    pub reactions: Vec<ReactionTally>,
    pub attachments: Vec<MediaAttachment>,
    pub embeds: Vec<MediaEmbed>,
    pub stickers: Vec<MediaSticker>,
    /// Name of the thread or forum post this message came from, when the
    /// collected channel is itself a thread.
    pub thread_label: Option<String>,
}
