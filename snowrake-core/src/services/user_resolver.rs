// File: src/services/user_resolver.rs

use std::collections::HashMap;

use futures_util::future::join_all;
use tracing::{debug, warn};

use snowrake_common::models::config::CallPolicy;
use snowrake_common::models::message::{AuthorStub, RawMessage};
use snowrake_common::models::snowflake::Snowflake;
use snowrake_common::models::user::{UserRecord, UserResolution};

use crate::pacing::call_with_retries;
use crate::platforms::ChannelHistoryApi;
use crate::services::context::RunContext;

/// Resolves extended identity for every author in a message set. Lookups
/// within a batch run concurrently, batches run sequentially, and a failed
/// lookup degrades to the author stub instead of failing the run.
pub struct UserResolver<'a> {
    api: &'a dyn ChannelHistoryApi,
    policy: &'a CallPolicy,
    guild_id: Snowflake,
    batch_width: usize,
}

impl<'a> UserResolver<'a> {
    pub fn new(
        api: &'a dyn ChannelHistoryApi,
        policy: &'a CallPolicy,
        guild_id: Snowflake,
        batch_width: usize,
    ) -> Self {
        Self {
            api,
            policy,
            guild_id,
            batch_width: batch_width.max(1),
        }
    }

    /// Fills the run context's user cache for every author id not already in
    /// it. Never fails; the worst case is degraded records.
    pub async fn resolve_all(&self, ctx: &mut RunContext, messages: &[RawMessage]) {
        let mut pending: Vec<AuthorStub> = Vec::new();
        for msg in messages {
            let id = msg.author.user_id;
            if ctx.users.contains_key(&id) || pending.iter().any(|s| s.user_id == id) {
                continue;
            }
            pending.push(msg.author.clone());
        }
        if pending.is_empty() {
            return;
        }

        let role_names = self.fetch_role_table().await;
        debug!(
            "Resolving {} users in batches of {}",
            pending.len(),
            self.batch_width
        );

        for chunk in pending.chunks(self.batch_width) {
            let lookups = chunk.iter().map(|stub| self.resolve_one(stub, &role_names));
            for record in join_all(lookups).await {
                ctx.users.insert(record.user_id, record);
            }
        }
    }

    /// Role table for the guild, fetched once per run. When the fetch fails
    /// the run continues with unnamed roles.
    async fn fetch_role_table(&self) -> HashMap<Snowflake, String> {
        let fetched = call_with_retries(self.policy, "fetch_roles", || {
            self.api.fetch_roles(self.guild_id)
        })
        .await;

        match fetched {
            Ok(roles) => roles
                .into_iter()
                // The everyone-role shares the guild id; output never names it.
                .filter(|r| r.role_id != self.guild_id)
                .map(|r| (r.role_id, r.name))
                .collect(),
            Err(e) => {
                warn!(
                    "Role table fetch failed for guild {} => {e}; continuing without role names",
                    self.guild_id
                );
                HashMap::new()
            }
        }
    }

    async fn resolve_one(
        &self,
        stub: &AuthorStub,
        role_names: &HashMap<Snowflake, String>,
    ) -> UserRecord {
        let fetched = call_with_retries(self.policy, "fetch_member", || {
            self.api.fetch_member(self.guild_id, stub.user_id)
        })
        .await;

        match fetched {
            Ok(member) => {
                let roles = member
                    .role_ids
                    .iter()
                    .filter_map(|rid| role_names.get(rid).cloned())
                    .collect();
                UserRecord {
                    user_id: stub.user_id,
                    username: if member.username.is_empty() {
                        stub.username.clone()
                    } else {
                        member.username
                    },
                    nickname: member.nickname.or_else(|| stub.display_name.clone()),
                    roles,
                    bot: stub.bot || member.bot,
                    resolution: UserResolution::Resolved,
                }
            }
            Err(e) => {
                warn!(
                    "Member lookup failed for {} => {e}; keeping the author stub",
                    stub.user_id
                );
                UserRecord {
                    user_id: stub.user_id,
                    username: stub.username.clone(),
                    nickname: stub.display_name.clone(),
                    roles: Vec::new(),
                    bot: stub.bot,
                    resolution: UserResolution::Degraded,
                }
            }
        }
    }
}
