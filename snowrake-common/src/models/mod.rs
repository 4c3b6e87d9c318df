// File: snowrake-common/src/models/mod.rs
pub mod batch;
pub mod channel;
pub mod config;
pub mod media;
pub mod message;
pub mod snowflake;
pub mod user;

pub use batch::{CollectedBatch, MediaRecord};
pub use channel::{ChannelDescriptor, ChannelKind};
pub use config::{CallPolicy, CollectionDetail, DiscordSourceConfig};
pub use media::{EmbedMedia, MediaAttachment, MediaEmbed, MediaKind, MediaSticker, StickerFormat};
pub use message::{AuthorStub, RawMessage, ReactionTally};
pub use snowflake::Snowflake;
pub use user::{UserRecord, UserResolution};
