// File: src/services/assembler.rs

//! Packages collection output for the downstream aggregation pipeline.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use snowrake_common::models::batch::CollectedBatch;
use snowrake_common::models::channel::ChannelDescriptor;
use snowrake_common::models::message::RawMessage;
use snowrake_common::models::snowflake::Snowflake;
use snowrake_common::models::user::UserRecord;

/// One historical channel-day. The content id is `{source}-{channel}-{date}`,
/// stable across reruns so the consumer can dedup.
pub fn assemble_daily(
    source: &str,
    channel: ChannelDescriptor,
    date: NaiveDate,
    users: HashMap<Snowflake, UserRecord>,
    messages: Vec<RawMessage>,
) -> CollectedBatch {
    CollectedBatch {
        content_id: format!("{source}-{}-{date}", channel.channel_id),
        source: source.to_string(),
        channel,
        date,
        users,
        messages,
    }
}

/// One incremental poll result. Polls are point-in-time, so the content id
/// carries the poll's unix timestamp instead of a date.
pub fn assemble_incremental(
    source: &str,
    channel: ChannelDescriptor,
    polled_at: DateTime<Utc>,
    users: HashMap<Snowflake, UserRecord>,
    messages: Vec<RawMessage>,
) -> CollectedBatch {
    CollectedBatch {
        content_id: format!("{source}-{}-{}", channel.channel_id, polled_at.timestamp()),
        source: source.to_string(),
        channel,
        date: polled_at.date_naive(),
        users,
        messages,
    }
}
