use std::collections::{HashMap, HashSet};

use snowrake_common::models::message::RawMessage;
use snowrake_common::models::snowflake::Snowflake;
use snowrake_common::models::user::UserRecord;

/// Mutable state scoped to one collection run. Created per (channel, date)
/// call and discarded after assembly; nothing in here crosses runs.
#[derive(Default)]
pub struct RunContext {
    /// Append-only user cache; each author is resolved at most once per run.
    pub users: HashMap<Snowflake, UserRecord>,
}

/// Accumulates one channel-day of messages with O(1) duplicate checks and
/// running id sentinels that seed the sweep anchors.
#[derive(Default)]
pub struct CollectedWindow {
    messages: Vec<RawMessage>,
    seen: HashSet<Snowflake>,
    earliest_seen: Option<Snowflake>,
    latest_seen: Option<Snowflake>,
}

impl CollectedWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the sentinels over a raw page id. Sentinels track every id
    /// the upstream returned, in-window or not, so a sweep can be seeded
    /// even when the anchor page lies entirely outside the window.
    pub fn note_seen_id(&mut self, id: Snowflake) {
        self.earliest_seen = Some(match self.earliest_seen {
            Some(cur) => cur.min(id),
            None => id,
        });
        self.latest_seen = Some(match self.latest_seen {
            Some(cur) => cur.max(id),
            None => id,
        });
    }

    /// Adds a message unless its id was already absorbed from an earlier,
    /// overlapping page. Returns whether the message was added.
    pub fn insert(&mut self, msg: RawMessage) -> bool {
        if !self.seen.insert(msg.message_id) {
            return false;
        }
        self.messages.push(msg);
        true
    }

    pub fn earliest_seen(&self) -> Option<Snowflake> {
        self.earliest_seen
    }

    pub fn latest_seen(&self) -> Option<Snowflake> {
        self.latest_seen
    }

    /// Final ordering: ascending creation time, ids as the tiebreak for
    /// messages landing in the same millisecond.
    pub fn into_sorted(self) -> Vec<RawMessage> {
        let mut messages = self.messages;
        messages.sort_by_key(|m| (m.created_at, m.message_id));
        messages
    }
}
