// File: src/test_utils/fixtures.rs

//! Shorthand constructors for the data tests feed through collectors.

use chrono::{DateTime, NaiveDate, Utc};

use snowrake_common::models::channel::{ChannelDescriptor, ChannelKind};
use snowrake_common::models::media::MediaAttachment;
use snowrake_common::models::message::{AuthorStub, RawMessage};
use snowrake_common::models::snowflake::{Snowflake, PLATFORM_EPOCH_MS};

use crate::platforms::{MemberInfo, RoleInfo};

/// A UTC instant with millisecond precision.
pub fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_milli_opt(h, mi, s, ms)
        .unwrap()
        .and_utc()
}

/// An id created at `at`, with `seq` filling the low non-timestamp bits so
/// several ids can share one millisecond.
pub fn id_at(at: DateTime<Utc>, seq: u64) -> Snowflake {
    Snowflake((((at.timestamp_millis() - PLATFORM_EPOCH_MS) as u64) << 22) | seq)
}

pub fn author(id: u64, username: &str) -> AuthorStub {
    AuthorStub {
        user_id: Snowflake(id),
        username: username.to_string(),
        display_name: None,
        bot: false,
    }
}

/// A plain text message whose id and creation time agree.
pub fn message_at(at: DateTime<Utc>, seq: u64, author: AuthorStub, content: &str) -> RawMessage {
    let id = id_at(at, seq);
    RawMessage {
        message_id: id,
        created_at: id.to_datetime(),
        edited_at: None,
        author,
        content: content.to_string(),
        reply_to: None,
        reactions: Vec::new(),
        attachments: Vec::new(),
        embeds: Vec::new(),
        stickers: Vec::new(),
        thread_label: None,
    }
}

/// Adds an image-style attachment to a message.
pub fn with_attachment(mut msg: RawMessage, filename: &str, content_type: &str) -> RawMessage {
    let n = msg.attachments.len() as u64;
    msg.attachments.push(MediaAttachment {
        attachment_id: Snowflake(msg.message_id.0.wrapping_add(n + 1)),
        filename: filename.to_string(),
        url: format!("https://cdn.discordapp.com/attachments/1/2/{filename}"),
        proxy_url: None,
        content_type: Some(content_type.to_string()),
        size: Some(1024),
        width: None,
        height: None,
    });
    msg
}

pub fn text_channel(id: u64, name: &str) -> ChannelDescriptor {
    ChannelDescriptor {
        channel_id: Snowflake(id),
        name: name.to_string(),
        topic: None,
        category: None,
        kind: ChannelKind::Text,
    }
}

pub fn thread_channel(id: u64, name: &str) -> ChannelDescriptor {
    ChannelDescriptor {
        channel_id: Snowflake(id),
        name: name.to_string(),
        topic: None,
        category: None,
        kind: ChannelKind::PublicThread,
    }
}

pub fn member(id: u64, username: &str, nickname: Option<&str>, role_ids: &[u64]) -> MemberInfo {
    MemberInfo {
        user_id: Snowflake(id),
        username: username.to_string(),
        nickname: nickname.map(str::to_string),
        role_ids: role_ids.iter().copied().map(Snowflake).collect(),
        bot: false,
    }
}

pub fn role(id: u64, name: &str) -> RoleInfo {
    RoleInfo {
        role_id: Snowflake(id),
        name: name.to_string(),
    }
}
