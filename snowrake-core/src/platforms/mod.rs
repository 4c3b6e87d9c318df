// File: src/platforms/mod.rs

use async_trait::async_trait;

use snowrake_common::models::channel::ChannelDescriptor;
use snowrake_common::models::message::RawMessage;
use snowrake_common::models::snowflake::Snowflake;

use crate::Error;

/// Which side of an anchor id a history page is requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAnchor {
    Around(Snowflake),
    Before(Snowflake),
    After(Snowflake),
}

impl PageAnchor {
    /// Query-parameter name and value for the wire request.
    pub fn query_param(&self) -> (&'static str, Snowflake) {
        match self {
            PageAnchor::Around(id) => ("around", *id),
            PageAnchor::Before(id) => ("before", *id),
            PageAnchor::After(id) => ("after", *id),
        }
    }
}

/// Member detail from a guild lookup, before merging with the author stub
/// into a user record.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub user_id: Snowflake,
    pub username: String,
    pub nickname: Option<String>,
    pub role_ids: Vec<Snowflake>,
    pub bot: bool,
}

/// One guild role. Only the name matters to collection output.
#[derive(Debug, Clone)]
pub struct RoleInfo {
    pub role_id: Snowflake,
    pub name: String,
}

/// The upstream message history API. Collectors see paging, channel metadata
/// and member lookups only through this seam; production uses the REST
/// client, tests plug in fakes from `test_utils`.
///
/// Pages come back in whatever order the upstream likes. Callers must not
/// rely on within-page ordering.
#[async_trait]
pub trait ChannelHistoryApi: Send + Sync {
    async fn fetch_page(
        &self,
        channel_id: Snowflake,
        anchor: PageAnchor,
        limit: u8,
    ) -> Result<Vec<RawMessage>, Error>;

    async fn fetch_channel(&self, channel_id: Snowflake) -> Result<ChannelDescriptor, Error>;

    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> Result<MemberInfo, Error>;

    async fn fetch_roles(&self, guild_id: Snowflake) -> Result<Vec<RoleInfo>, Error>;
}

pub mod discord;
