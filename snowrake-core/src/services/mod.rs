// File: src/services/mod.rs

pub mod assembler;
pub mod context;
pub mod incremental_collector;
pub mod manifest;
pub mod media_extractor;
pub mod source;
pub mod user_resolver;
pub mod window_collector;

pub use source::DiscordSource;
