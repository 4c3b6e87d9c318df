use serde::{Deserialize, Serialize};

use super::snowflake::Snowflake;

/// How a user record was obtained. `Degraded` means the member lookup
/// failed and the record only carries what the author stub had.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserResolution {
    Resolved,
    Degraded,
}

/// Extended identity for one message author. Resolved at most once per
/// collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: Snowflake,
    pub username: String,
    pub nickname: Option<String>,
    /// Role names, excluding the implicit everyone-role.
    pub roles: Vec<String>,
    pub bot: bool,
    pub resolution: UserResolution,
}
