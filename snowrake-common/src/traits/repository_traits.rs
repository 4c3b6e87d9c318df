use async_trait::async_trait;

use crate::error::Error;
use crate::models::snowflake::Snowflake;

/// Persisted pagination cursors, keyed `{source}-{channelId}`. The cursor is
/// the only state that crosses collection runs; real implementations live in
/// the host's storage plugin.
#[async_trait]
pub trait CursorRepository: Send + Sync {
    async fn get_cursor(&self, key: &str) -> Result<Option<Snowflake>, Error>;
    async fn set_cursor(&self, key: &str, value: Snowflake) -> Result<(), Error>;
}
