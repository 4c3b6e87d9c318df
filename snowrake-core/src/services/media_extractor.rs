// File: src/services/media_extractor.rs

//! Normalizes upstream media payloads and answers "does this message carry
//! media?". Pure functions, no I/O.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use snowrake_common::models::config::CollectionDetail;
use snowrake_common::models::media::{
    EmbedMedia, MediaAttachment, MediaEmbed, MediaSticker, StickerFormat,
};
use snowrake_common::models::message::RawMessage;
use snowrake_common::models::snowflake::Snowflake;

use crate::platforms::discord::wire::{
    AttachmentJson, EmbedJson, EmbedMediaJson, StickerItemJson, StickerJson,
};

const CDN_HOSTS: &[&str] = &["cdn.discordapp.com", "media.discordapp.net"];

/// Expiring signature params the CDN appends; stripping them keeps one url
/// per file across fetches.
const STRIPPED_PARAMS: &[&str] = &["ex", "is", "hm"];

const MEDIA_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "svg", "mp4", "webm", "mov", "avi", "mkv", "mp3",
    "ogg", "wav", "flac",
];

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s<>]+").unwrap());

/// Strips the expiring signature params from platform CDN links. Other
/// params (format, size) are kept; non-CDN urls pass through untouched.
pub fn normalize_media_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };
    if !parsed.host_str().is_some_and(|h| CDN_HOSTS.contains(&h)) {
        return raw.to_string();
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !STRIPPED_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    parsed.set_query(None);
    if !kept.is_empty() {
        parsed
            .query_pairs_mut()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    parsed.to_string()
}

pub fn has_media_extension(name: &str) -> bool {
    let trimmed = name.split(['?', '#']).next().unwrap_or(name);
    match trimmed.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            MEDIA_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

pub fn is_media_attachment(att: &MediaAttachment) -> bool {
    if let Some(ct) = &att.content_type {
        if ct.starts_with("image/") || ct.starts_with("video/") || ct.starts_with("audio/") {
            return true;
        }
    }
    has_media_extension(&att.filename)
}

/// Scans free text for bare links to media files.
pub fn text_contains_media_url(text: &str) -> bool {
    URL_RE
        .find_iter(text)
        .any(|m| has_media_extension(m.as_str().trim_end_matches(['.', ',', ')', ']', '>'])))
}

/// Whether a message survives the configured detail mode. `Full` keeps
/// everything in the window; `MediaOnly` keeps only messages that carry
/// downloadable media, including bare media links in otherwise plain text.
pub fn retained(msg: &RawMessage, detail: CollectionDetail) -> bool {
    match detail {
        CollectionDetail::Full => true,
        CollectionDetail::MediaOnly => {
            msg.attachments.iter().any(is_media_attachment)
                || !msg.embeds.is_empty()
                || !msg.stickers.is_empty()
                || text_contains_media_url(&msg.content)
        }
    }
}

pub fn normalize_attachment(a: AttachmentJson) -> MediaAttachment {
    MediaAttachment {
        attachment_id: a.id,
        filename: a.filename,
        url: normalize_media_url(&a.url),
        proxy_url: a.proxy_url.as_deref().map(normalize_media_url),
        content_type: a.content_type,
        size: a.size,
        width: a.width,
        height: a.height,
    }
}

pub fn normalize_embed(e: EmbedJson) -> MediaEmbed {
    MediaEmbed {
        title: e.title,
        description: e.description,
        url: e.url,
        color: e.color,
        image: e.image.map(normalize_embed_media),
        thumbnail: e.thumbnail.map(normalize_embed_media),
        video: e.video.map(normalize_embed_media),
    }
}

fn normalize_embed_media(m: EmbedMediaJson) -> EmbedMedia {
    EmbedMedia {
        url: normalize_media_url(&m.url),
        proxy_url: m.proxy_url.as_deref().map(normalize_media_url),
        width: m.width,
        height: m.height,
    }
}

/// Merges the compact sticker refs with the legacy full objects; only the
/// legacy shape carries descriptions.
pub fn normalize_stickers(
    items: Vec<StickerItemJson>,
    legacy: Vec<StickerJson>,
) -> Vec<MediaSticker> {
    let mut legacy_by_id: HashMap<Snowflake, StickerJson> =
        legacy.into_iter().map(|s| (s.id, s)).collect();

    let mut out: Vec<MediaSticker> = items
        .into_iter()
        .map(|item| {
            let description = legacy_by_id.remove(&item.id).and_then(|s| s.description);
            MediaSticker {
                sticker_id: item.id,
                name: item.name,
                format: StickerFormat::from_code(item.format_type),
                description,
            }
        })
        .collect();

    // Very old payloads only carried the legacy array.
    let mut leftovers: Vec<StickerJson> = legacy_by_id.into_values().collect();
    leftovers.sort_by_key(|s| s.id);
    for s in leftovers {
        out.push(MediaSticker {
            sticker_id: s.id,
            name: s.name,
            format: StickerFormat::from_code(s.format_type),
            description: s.description,
        });
    }
    out
}
