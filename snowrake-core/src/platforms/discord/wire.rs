// File: src/platforms/discord/wire.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;

use snowrake_common::models::channel::{ChannelDescriptor, ChannelKind};
use snowrake_common::models::message::{AuthorStub, RawMessage, ReactionTally};
use snowrake_common::models::snowflake::Snowflake;

use crate::platforms::{MemberInfo, RoleInfo};
use crate::services::media_extractor;
use crate::Error;

/// JSON shape of one entry in `GET /channels/{id}/messages`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MessageJson {
    pub id: Snowflake,
    pub author: AuthorJson,
    pub content: String,
    pub timestamp: String,
    pub edited_timestamp: Option<String>,
    pub attachments: Vec<AttachmentJson>,
    pub embeds: Vec<EmbedJson>,
    pub sticker_items: Vec<StickerItemJson>,
    pub stickers: Vec<StickerJson>,
    pub reactions: Vec<ReactionJson>,
    pub message_reference: Option<MessageReferenceJson>,
}

impl MessageJson {
    /// Normalizes the wire payload. A malformed timestamp is a hard error;
    /// the rest of the schema is trusted.
    pub fn into_model(self) -> Result<RawMessage, Error> {
        let created_at = parse_timestamp(&self.timestamp)?;
        let edited_at = match &self.edited_timestamp {
            Some(ts) => Some(parse_timestamp(ts)?),
            None => None,
        };
        let stickers = media_extractor::normalize_stickers(self.sticker_items, self.stickers);

        Ok(RawMessage {
            message_id: self.id,
            created_at,
            edited_at,
            author: self.author.into_stub(),
            content: self.content,
            reply_to: self.message_reference.and_then(|r| r.message_id),
            reactions: self
                .reactions
                .into_iter()
                .map(ReactionJson::into_tally)
                .collect(),
            attachments: self
                .attachments
                .into_iter()
                .map(media_extractor::normalize_attachment)
                .collect(),
            embeds: self
                .embeds
                .into_iter()
                .map(media_extractor::normalize_embed)
                .collect(),
            stickers,
            thread_label: None,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, Error> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AuthorJson {
    pub id: Snowflake,
    pub username: String,
    pub global_name: Option<String>,
    pub bot: bool,
}

impl AuthorJson {
    pub fn into_stub(self) -> AuthorStub {
        AuthorStub {
            user_id: self.id,
            username: self.username,
            display_name: self.global_name,
            bot: self.bot,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AttachmentJson {
    pub id: Snowflake,
    pub filename: String,
    pub url: String,
    pub proxy_url: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct EmbedJson {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Option<u32>,
    pub image: Option<EmbedMediaJson>,
    pub thumbnail: Option<EmbedMediaJson>,
    pub video: Option<EmbedMediaJson>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct EmbedMediaJson {
    pub url: String,
    pub proxy_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Compact sticker reference carried on message payloads.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StickerItemJson {
    pub id: Snowflake,
    pub name: String,
    pub format_type: u8,
}

/// Legacy full sticker object; some payloads still carry it and it is the
/// only place a description appears.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StickerJson {
    pub id: Snowflake,
    pub name: String,
    pub format_type: u8,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ReactionJson {
    pub count: u64,
    pub emoji: EmojiJson,
}

impl ReactionJson {
    pub fn into_tally(self) -> ReactionTally {
        let emoji = match (self.emoji.name, self.emoji.id) {
            (Some(name), _) => name,
            (None, Some(id)) => id.to_string(),
            (None, None) => String::new(),
        };
        ReactionTally {
            emoji,
            count: self.count,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct EmojiJson {
    pub id: Option<Snowflake>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MessageReferenceJson {
    pub message_id: Option<Snowflake>,
}

/// JSON shape of `GET /channels/{id}`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ChannelJson {
    pub id: Snowflake,
    pub name: Option<String>,
    pub topic: Option<String>,
    #[serde(rename = "type")]
    pub kind: u8,
    pub parent_id: Option<Snowflake>,
}

impl ChannelJson {
    pub fn into_descriptor(self, category: Option<String>) -> ChannelDescriptor {
        ChannelDescriptor {
            channel_id: self.id,
            name: self.name.unwrap_or_else(|| self.id.to_string()),
            topic: self.topic,
            category,
            kind: ChannelKind::from_code(self.kind),
        }
    }
}

/// JSON shape of `GET /guilds/{gid}/members/{uid}`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MemberJson {
    pub user: AuthorJson,
    pub nick: Option<String>,
    pub roles: Vec<Snowflake>,
}

impl MemberJson {
    pub fn into_member_info(self) -> MemberInfo {
        let display_name = self.user.global_name.clone();
        MemberInfo {
            user_id: self.user.id,
            username: self.user.username,
            nickname: self.nick.or(display_name),
            role_ids: self.roles,
            bot: self.user.bot,
        }
    }
}

/// JSON shape of one entry in `GET /guilds/{gid}/roles`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RoleJson {
    pub id: Snowflake,
    pub name: String,
}

impl RoleJson {
    pub fn into_role_info(self) -> RoleInfo {
        RoleInfo {
            role_id: self.id,
            name: self.name,
        }
    }
}

/// Error body the upstream attaches to non-success responses.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ApiErrorJson {
    pub message: String,
    pub code: u64,
    pub retry_after: Option<f64>,
}
