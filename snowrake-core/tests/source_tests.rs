// tests/source_tests.rs

use std::sync::Arc;

use chrono::NaiveDate;

use snowrake_core::models::config::{CallPolicy, CollectionDetail, DiscordSourceConfig};
use snowrake_core::models::message::RawMessage;
use snowrake_core::models::snowflake::Snowflake;
use snowrake_core::models::user::UserResolution;
use snowrake_core::services::DiscordSource;
use snowrake_core::test_utils::fixtures::{
    author, member, message_at, role, text_channel, thread_channel, ts, with_attachment,
};
use snowrake_core::test_utils::{FakeHistory, MemoryCursorRepository};
use snowrake_core::Error;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(channels: &[u64]) -> DiscordSourceConfig {
    DiscordSourceConfig {
        source_name: "disc".to_string(),
        bot_token: "test-token".to_string(),
        guild_id: Snowflake(999),
        channel_ids: channels.iter().copied().map(Snowflake).collect(),
        page_size: 50,
        resolver_batch_width: 10,
        rolling_window_secs: 3600,
        detail: CollectionDetail::Full,
        call_policy: CallPolicy::default(),
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn ids(msgs: &[RawMessage]) -> Vec<Snowflake> {
    msgs.iter().map(|m| m.message_id).collect()
}

#[tokio::test(start_paused = true)]
async fn test_collect_date_builds_a_batch_per_channel() -> Result<(), Error> {
    init_tracing();
    let fake = Arc::new(
        FakeHistory::new()
            .with_messages(
                Snowflake(101),
                vec![
                    message_at(ts(2024, 3, 15, 9, 0, 0, 0), 1, author(1, "kay"), "morning"),
                    message_at(ts(2024, 3, 15, 9, 5, 0, 0), 1, author(1, "kay"), "coffee"),
                ],
            )
            .with_messages(
                Snowflake(102),
                vec![message_at(
                    ts(2024, 3, 15, 10, 0, 0, 0),
                    1,
                    author(2, "mira"),
                    "hi",
                )],
            )
            .with_channel(text_channel(101, "general"))
            .with_channel(text_channel(102, "dev"))
            .with_member(member(1, "kay_core", Some("Kay"), &[10]))
            .with_member(member(2, "mira_core", None, &[]))
            .with_roles(vec![role(999, "@everyone"), role(10, "Crew")]),
    );
    let cursors = Arc::new(MemoryCursorRepository::new());
    let source = DiscordSource::new(fake, cursors, config(&[101, 102]));

    let batches = source.collect_date(day()).await?;

    assert_eq!(batches.len(), 2);
    let first = &batches[0];
    assert_eq!(first.content_id, "disc-101-2024-03-15");
    assert_eq!(first.source, "disc");
    assert_eq!(first.channel.name, "general");
    assert_eq!(first.date, day());
    assert_eq!(first.messages.len(), 2);
    let kay = &first.users[&Snowflake(1)];
    assert_eq!(kay.username, "kay_core");
    assert_eq!(kay.nickname.as_deref(), Some("Kay"));
    assert_eq!(kay.roles, vec!["Crew".to_string()]);
    assert_eq!(kay.resolution, UserResolution::Resolved);

    assert_eq!(batches[1].content_id, "disc-102-2024-03-15");
    assert_eq!(batches[1].messages.len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_channel_is_skipped() -> Result<(), Error> {
    init_tracing();
    let fake = Arc::new(
        FakeHistory::new()
            .with_messages(
                Snowflake(101),
                vec![message_at(
                    ts(2024, 3, 15, 9, 0, 0, 0),
                    1,
                    author(1, "kay"),
                    "still here",
                )],
            )
            .with_channel(text_channel(101, "general"))
            .with_member(member(1, "kay_core", None, &[]))
            .deny_channel(Snowflake(103)),
    );
    let cursors = Arc::new(MemoryCursorRepository::new());
    let source = DiscordSource::new(fake, cursors, config(&[103, 101]));

    // The denied channel is logged and dropped; the healthy one survives.
    let batches = source.collect_date(day()).await?;

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].channel.channel_id, Snowflake(101));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_quiet_channels_produce_no_batches() -> Result<(), Error> {
    init_tracing();
    let fake = Arc::new(FakeHistory::new().with_channel(text_channel(104, "archive")));
    let cursors = Arc::new(MemoryCursorRepository::new());
    let source = DiscordSource::new(fake, cursors, config(&[104]));

    let batches = source.collect_date(day()).await?;

    assert!(batches.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_thread_channels_label_their_messages() -> Result<(), Error> {
    init_tracing();
    let fake = Arc::new(
        FakeHistory::new()
            .with_messages(
                Snowflake(105),
                vec![
                    message_at(ts(2024, 3, 15, 14, 0, 0, 0), 1, author(3, "pic"), "found it"),
                    message_at(ts(2024, 3, 15, 14, 2, 0, 0), 1, author(3, "pic"), "fixed it"),
                ],
            )
            .with_channel(thread_channel(105, "bug-hunt"))
            .with_member(member(3, "pic_core", None, &[])),
    );
    let cursors = Arc::new(MemoryCursorRepository::new());
    let source = DiscordSource::new(fake, cursors, config(&[105]));

    let batches = source.collect_date(day()).await?;

    assert_eq!(batches.len(), 1);
    assert!(batches[0]
        .messages
        .iter()
        .all(|m| m.thread_label.as_deref() == Some("bug-hunt")));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_media_only_config_reaches_the_collector() -> Result<(), Error> {
    init_tracing();
    let plain = message_at(ts(2024, 3, 15, 9, 0, 0, 0), 1, author(1, "kay"), "chatter");
    let attached = with_attachment(
        message_at(ts(2024, 3, 15, 9, 1, 0, 0), 1, author(1, "kay"), ""),
        "cat.png",
        "image/png",
    );
    let fake = Arc::new(
        FakeHistory::new()
            .with_messages(Snowflake(101), vec![plain, attached.clone()])
            .with_channel(text_channel(101, "general"))
            .with_member(member(1, "kay_core", None, &[])),
    );
    let cursors = Arc::new(MemoryCursorRepository::new());
    let mut cfg = config(&[101]);
    cfg.detail = CollectionDetail::MediaOnly;
    let source = DiscordSource::new(fake, cursors, cfg);

    let batches = source.collect_date(day()).await?;

    assert_eq!(batches.len(), 1);
    assert_eq!(ids(&batches[0].messages), vec![attached.message_id]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_poll_recent_end_to_end() -> Result<(), Error> {
    init_tracing();
    let now = ts(2024, 3, 15, 12, 0, 0, 0);
    let stale = message_at(ts(2024, 3, 15, 9, 0, 0, 0), 1, author(1, "kay"), "early");
    let fresh = message_at(ts(2024, 3, 15, 11, 30, 0, 0), 1, author(1, "kay"), "recent");
    let cursors = Arc::new(MemoryCursorRepository::new());

    // 1) First poll: only the message inside the rolling window comes back.
    let fake = Arc::new(
        FakeHistory::new()
            .with_messages(Snowflake(101), vec![stale.clone(), fresh.clone()])
            .with_channel(text_channel(101, "general"))
            .with_member(member(1, "kay_core", None, &[]))
            .with_roles(vec![role(999, "@everyone")]),
    );
    let source = DiscordSource::new(fake, cursors.clone(), config(&[101]));
    let batches = source.poll_recent(now).await?;

    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].content_id,
        format!("disc-101-{}", now.timestamp())
    );
    assert_eq!(batches[0].date, day());
    assert_eq!(ids(&batches[0].messages), vec![fresh.message_id]);
    assert_eq!(
        batches[0].users[&Snowflake(1)].resolution,
        UserResolution::Resolved
    );
    assert_eq!(cursors.snapshot().get("disc-101"), Some(&fresh.message_id));

    // 2) A later run against grown history picks up only what is new.
    let later = message_at(ts(2024, 3, 15, 11, 45, 0, 0), 1, author(1, "kay"), "newer");
    let fake = Arc::new(
        FakeHistory::new()
            .with_messages(
                Snowflake(101),
                vec![stale.clone(), fresh.clone(), later.clone()],
            )
            .with_channel(text_channel(101, "general"))
            .with_member(member(1, "kay_core", None, &[]))
            .with_roles(vec![role(999, "@everyone")]),
    );
    let source = DiscordSource::new(fake, cursors.clone(), config(&[101]));
    let second = source.poll_recent(now).await?;

    assert_eq!(second.len(), 1);
    assert_eq!(ids(&second[0].messages), vec![later.message_id]);
    assert_eq!(cursors.snapshot().get("disc-101"), Some(&later.message_id));

    // 3) Nothing newer: a quiet poll produces no batches at all.
    let third = source.poll_recent(now).await?;
    assert!(third.is_empty());
    Ok(())
}
