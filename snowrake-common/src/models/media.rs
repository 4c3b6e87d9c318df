use serde::{Deserialize, Serialize};

use super::snowflake::Snowflake;

/// Normalized file attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub attachment_id: Snowflake,
    pub filename: String,
    pub url: String,
    /// CDN proxy link, kept as a fallback for when the direct url expires.
    pub proxy_url: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Image/thumbnail/video sub-object of an embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedMedia {
    pub url: String,
    pub proxy_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Normalized embed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Option<u32>,
    pub image: Option<EmbedMedia>,
    pub thumbnail: Option<EmbedMedia>,
    pub video: Option<EmbedMedia>,
}

/// Sticker image formats, mapped from the numeric codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerFormat {
    Png,
    Apng,
    Lottie,
    Gif,
    Unknown,
}

impl StickerFormat {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => StickerFormat::Png,
            2 => StickerFormat::Apng,
            3 => StickerFormat::Lottie,
            4 => StickerFormat::Gif,
            _ => StickerFormat::Unknown,
        }
    }

    /// File extension the CDN serves for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            StickerFormat::Png | StickerFormat::Apng | StickerFormat::Unknown => "png",
            StickerFormat::Lottie => "json",
            StickerFormat::Gif => "gif",
        }
    }
}

/// Normalized sticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSticker {
    pub sticker_id: Snowflake,
    pub name: String,
    pub format: StickerFormat,
    pub description: Option<String>,
}

/// Kind tags used in the media manifest. The wire strings match what the
/// downstream downloader expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Attachment,
    EmbedImage,
    EmbedThumbnail,
    EmbedVideo,
    Sticker,
}
