// File: src/services/manifest.rs

//! Flattens assembled batches into per-file media records for the external
//! downloader.

use sha2::{Digest, Sha256};

use snowrake_common::models::batch::{CollectedBatch, MediaRecord};
use snowrake_common::models::media::{EmbedMedia, MediaKind};
use snowrake_common::models::message::RawMessage;
use snowrake_common::models::snowflake::Snowflake;

/// One record per attachment, embed image/thumbnail/video and sticker in
/// the batch, in message order.
pub fn media_records(batch: &CollectedBatch) -> Vec<MediaRecord> {
    let mut out = Vec::new();
    let channel_id = batch.channel.channel_id;

    for msg in &batch.messages {
        for att in &msg.attachments {
            out.push(MediaRecord {
                url: att.url.clone(),
                proxy_url: att.proxy_url.clone(),
                media_type: MediaKind::Attachment,
                filename: att.filename.clone(),
                unique_name: unique_name(&att.filename, &att.url),
                channel_id,
                message_id: msg.message_id,
                user_id: msg.author.user_id,
                size: att.size,
            });
        }
        for emb in &msg.embeds {
            push_embed_media(&mut out, msg, channel_id, emb.image.as_ref(), MediaKind::EmbedImage);
            push_embed_media(
                &mut out,
                msg,
                channel_id,
                emb.thumbnail.as_ref(),
                MediaKind::EmbedThumbnail,
            );
            push_embed_media(&mut out, msg, channel_id, emb.video.as_ref(), MediaKind::EmbedVideo);
        }
        for sticker in &msg.stickers {
            let filename = format!("{}.{}", sticker.name, sticker.format.extension());
            let url = format!(
                "https://media.discordapp.net/stickers/{}.{}",
                sticker.sticker_id,
                sticker.format.extension()
            );
            out.push(MediaRecord {
                unique_name: unique_name(&filename, &url),
                url,
                proxy_url: None,
                media_type: MediaKind::Sticker,
                filename,
                channel_id,
                message_id: msg.message_id,
                user_id: msg.author.user_id,
                size: None,
            });
        }
    }
    out
}

fn push_embed_media(
    out: &mut Vec<MediaRecord>,
    msg: &RawMessage,
    channel_id: Snowflake,
    media: Option<&EmbedMedia>,
    kind: MediaKind,
) {
    let Some(media) = media else { return };
    let filename = filename_from_url(&media.url);
    out.push(MediaRecord {
        url: media.url.clone(),
        proxy_url: media.proxy_url.clone(),
        media_type: kind,
        unique_name: unique_name(&filename, &media.url),
        filename,
        channel_id,
        message_id: msg.message_id,
        user_id: msg.author.user_id,
        size: None,
    });
}

/// Last path segment of the url, or "embed" when the url has no usable one.
fn filename_from_url(url: &str) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .trim_end_matches('/');
    match path.rsplit('/').next() {
        Some(seg) if !seg.is_empty() && !seg.contains(':') => seg.to_string(),
        _ => "embed".to_string(),
    }
}

/// `{sanitized-name}_{hash8}.{ext}`: collision-free but human-readable.
/// The hash covers the normalized url, so the same file always maps to the
/// same name.
pub fn unique_name(filename: &str, url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hash8: String = digest
        .iter()
        .take(4)
        .map(|b| format!("{b:02x}"))
        .collect();

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext.to_ascii_lowercase()),
        _ => (filename, "bin".to_string()),
    };
    let mut sanitized = String::with_capacity(stem.len());
    let mut last_dash = true;
    for c in stem.to_ascii_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            sanitized.push(c);
            last_dash = false;
        } else if !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let sanitized = sanitized.trim_end_matches('-');
    let sanitized = if sanitized.is_empty() { "file" } else { sanitized };

    format!("{sanitized}_{hash8}.{ext}")
}
