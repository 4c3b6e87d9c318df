use serde::{Deserialize, Serialize};

use super::snowflake::Snowflake;

/// Platform channel types, mapped from the numeric codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Announcement,
    AnnouncementThread,
    PublicThread,
    PrivateThread,
    Stage,
    Forum,
    Media,
    Unknown,
}

impl ChannelKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ChannelKind::Text,
            2 => ChannelKind::Voice,
            4 => ChannelKind::Category,
            5 => ChannelKind::Announcement,
            10 => ChannelKind::AnnouncementThread,
            11 => ChannelKind::PublicThread,
            12 => ChannelKind::PrivateThread,
            13 => ChannelKind::Stage,
            15 => ChannelKind::Forum,
            16 => ChannelKind::Media,
            _ => ChannelKind::Unknown,
        }
    }

    pub fn is_thread(&self) -> bool {
        matches!(
            self,
            ChannelKind::AnnouncementThread | ChannelKind::PublicThread | ChannelKind::PrivateThread
        )
    }
}

/// Immutable channel snapshot, fetched once per collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub channel_id: Snowflake,
    pub name: String,
    pub topic: Option<String>,
    /// Parent category name, or the parent forum for thread channels.
    pub category: Option<String>,
    pub kind: ChannelKind,
}
