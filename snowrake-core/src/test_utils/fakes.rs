// File: src/test_utils/fakes.rs

//! Hand-rolled in-memory stand-ins for the upstream API and the cursor
//! store. Tests drive collectors against these instead of the network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use snowrake_common::models::channel::ChannelDescriptor;
use snowrake_common::models::message::RawMessage;
use snowrake_common::models::snowflake::Snowflake;
use snowrake_common::traits::repository_traits::CursorRepository;
use snowrake_common::Error;

use crate::platforms::{ChannelHistoryApi, MemberInfo, PageAnchor, RoleInfo};

/// Tracks how many member lookups run at once, and how often the in-flight
/// count rises from zero (one rise per sequential batch).
#[derive(Default)]
struct LookupProbe {
    current: usize,
    peak: usize,
    rises: usize,
}

/// A guild's worth of canned history. Pages out of the per-channel message
/// lists the way the platform does: `before` newest-first, `after`
/// oldest-first, `around` a window centered on the anchor.
#[derive(Default)]
pub struct FakeHistory {
    history: HashMap<Snowflake, Vec<RawMessage>>,
    channels: HashMap<Snowflake, ChannelDescriptor>,
    members: HashMap<Snowflake, MemberInfo>,
    roles: Vec<RoleInfo>,
    denied: HashSet<Snowflake>,
    deny_roles: bool,
    member_delay: Duration,
    pub page_calls: AtomicUsize,
    pub role_calls: AtomicUsize,
    member_log: Mutex<Vec<Snowflake>>,
    probe: Mutex<LookupProbe>,
}

impl FakeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a channel's message history; kept sorted ascending by id.
    pub fn with_messages(mut self, channel_id: Snowflake, mut msgs: Vec<RawMessage>) -> Self {
        msgs.sort_by_key(|m| m.message_id);
        self.history.insert(channel_id, msgs);
        self
    }

    pub fn with_channel(mut self, desc: ChannelDescriptor) -> Self {
        self.channels.insert(desc.channel_id, desc);
        self
    }

    pub fn with_member(mut self, member: MemberInfo) -> Self {
        self.members.insert(member.user_id, member);
        self
    }

    pub fn with_roles(mut self, roles: Vec<RoleInfo>) -> Self {
        self.roles = roles;
        self
    }

    /// Every call touching this channel answers with a permission failure.
    pub fn deny_channel(mut self, channel_id: Snowflake) -> Self {
        self.denied.insert(channel_id);
        self
    }

    pub fn deny_roles(mut self) -> Self {
        self.deny_roles = true;
        self
    }

    /// Simulated latency per member lookup, so concurrency is observable
    /// under a paused clock.
    pub fn with_member_delay(mut self, delay: Duration) -> Self {
        self.member_delay = delay;
        self
    }

    pub fn page_call_count(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn role_call_count(&self) -> usize {
        self.role_calls.load(Ordering::SeqCst)
    }

    /// Every member id looked up, in call order, duplicates included.
    pub fn member_lookups(&self) -> Vec<Snowflake> {
        self.member_log.lock().unwrap().clone()
    }

    pub fn peak_member_concurrency(&self) -> usize {
        self.probe.lock().unwrap().peak
    }

    pub fn member_batch_count(&self) -> usize {
        self.probe.lock().unwrap().rises
    }
}

#[async_trait]
impl ChannelHistoryApi for FakeHistory {
    async fn fetch_page(
        &self,
        channel_id: Snowflake,
        anchor: PageAnchor,
        limit: u8,
    ) -> Result<Vec<RawMessage>, Error> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.denied.contains(&channel_id) {
            return Err(Error::PermissionDenied(format!("channel {channel_id}")));
        }
        let Some(msgs) = self.history.get(&channel_id) else {
            return Ok(Vec::new());
        };
        let limit = limit as usize;

        let page = match anchor {
            PageAnchor::Before(id) => {
                let end = msgs.partition_point(|m| m.message_id < id);
                let start = end.saturating_sub(limit);
                msgs[start..end].iter().rev().cloned().collect()
            }
            PageAnchor::After(id) => {
                let start = msgs.partition_point(|m| m.message_id <= id);
                let end = (start + limit).min(msgs.len());
                msgs[start..end].to_vec()
            }
            PageAnchor::Around(id) => {
                let pivot = msgs.partition_point(|m| m.message_id < id);
                let start = pivot.saturating_sub(limit / 2).min(msgs.len());
                let end = (start + limit).min(msgs.len());
                msgs[start..end].iter().rev().cloned().collect()
            }
        };
        Ok(page)
    }

    async fn fetch_channel(&self, channel_id: Snowflake) -> Result<ChannelDescriptor, Error> {
        if self.denied.contains(&channel_id) {
            return Err(Error::PermissionDenied(format!("channel {channel_id}")));
        }
        self.channels
            .get(&channel_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("channel {channel_id}")))
    }

    async fn fetch_member(
        &self,
        _guild_id: Snowflake,
        user_id: Snowflake,
    ) -> Result<MemberInfo, Error> {
        self.member_log.lock().unwrap().push(user_id);
        {
            let mut probe = self.probe.lock().unwrap();
            if probe.current == 0 {
                probe.rises += 1;
            }
            probe.current += 1;
            probe.peak = probe.peak.max(probe.current);
        }
        if !self.member_delay.is_zero() {
            tokio::time::sleep(self.member_delay).await;
        }
        self.probe.lock().unwrap().current -= 1;

        self.members
            .get(&user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("member {user_id}")))
    }

    async fn fetch_roles(&self, _guild_id: Snowflake) -> Result<Vec<RoleInfo>, Error> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        if self.deny_roles {
            return Err(Error::PermissionDenied("roles".to_string()));
        }
        Ok(self.roles.clone())
    }
}

/// Answers `fetch_page` from a fixed script of results, in order. Once the
/// script runs out, every further page is empty. For driving collectors
/// through exact page sequences, overlaps and mid-sweep failures.
#[derive(Default)]
pub struct ScriptedHistory {
    pages: Mutex<VecDeque<Result<Vec<RawMessage>, Error>>>,
    anchors: Mutex<Vec<PageAnchor>>,
}

impl ScriptedHistory {
    pub fn new(pages: Vec<Result<Vec<RawMessage>, Error>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            anchors: Mutex::new(Vec::new()),
        }
    }

    /// Anchors of every `fetch_page` call so far, in call order.
    pub fn seen_anchors(&self) -> Vec<PageAnchor> {
        self.anchors.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelHistoryApi for ScriptedHistory {
    async fn fetch_page(
        &self,
        _channel_id: Snowflake,
        anchor: PageAnchor,
        _limit: u8,
    ) -> Result<Vec<RawMessage>, Error> {
        self.anchors.lock().unwrap().push(anchor);
        match self.pages.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_channel(&self, channel_id: Snowflake) -> Result<ChannelDescriptor, Error> {
        Err(Error::NotFound(format!("channel {channel_id}")))
    }

    async fn fetch_member(
        &self,
        _guild_id: Snowflake,
        user_id: Snowflake,
    ) -> Result<MemberInfo, Error> {
        Err(Error::NotFound(format!("member {user_id}")))
    }

    async fn fetch_roles(&self, _guild_id: Snowflake) -> Result<Vec<RoleInfo>, Error> {
        Ok(Vec::new())
    }
}

/// In-memory cursor store.
#[derive(Default)]
pub struct MemoryCursorRepository {
    cursors: Mutex<HashMap<String, Snowflake>>,
}

impl MemoryCursorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, key: &str, value: Snowflake) {
        self.cursors.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn snapshot(&self) -> HashMap<String, Snowflake> {
        self.cursors.lock().unwrap().clone()
    }
}

#[async_trait]
impl CursorRepository for MemoryCursorRepository {
    async fn get_cursor(&self, key: &str) -> Result<Option<Snowflake>, Error> {
        Ok(self.cursors.lock().unwrap().get(key).copied())
    }

    async fn set_cursor(&self, key: &str, value: Snowflake) -> Result<(), Error> {
        self.cursors.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}
