// tests/incremental_tests.rs

use chrono::Duration;

use snowrake_core::models::config::CallPolicy;
use snowrake_core::models::message::RawMessage;
use snowrake_core::models::snowflake::Snowflake;
use snowrake_core::pacing::Pacer;
use snowrake_core::services::incremental_collector::{cursor_key, IncrementalCollector};
use snowrake_core::test_utils::fixtures::{author, id_at, message_at, ts};
use snowrake_core::test_utils::{FakeHistory, MemoryCursorRepository, ScriptedHistory};
use snowrake_core::Error;

const CHANNEL: Snowflake = Snowflake(777);
const SOURCE: &str = "disc";

fn ids(msgs: &[RawMessage]) -> Vec<Snowflake> {
    msgs.iter().map(|m| m.message_id).collect()
}

#[tokio::test(start_paused = true)]
async fn test_first_poll_anchors_at_recency_horizon() -> Result<(), Error> {
    // Poll at noon with a one-hour window: only post-11:00 traffic counts.
    let now = ts(2024, 3, 15, 12, 0, 0, 0);
    let old = message_at(ts(2024, 3, 15, 10, 0, 0, 0), 1, author(1, "kay"), "old");
    let b = message_at(ts(2024, 3, 15, 11, 30, 0, 0), 1, author(1, "kay"), "b");
    let c = message_at(ts(2024, 3, 15, 11, 45, 0, 0), 1, author(1, "kay"), "c");
    let fake = FakeHistory::new().with_messages(CHANNEL, vec![old, b.clone(), c.clone()]);
    let cursors = MemoryCursorRepository::new();
    let policy = CallPolicy::default();
    let collector = IncrementalCollector::new(&fake, &cursors, &policy, 100, Duration::hours(1));
    let mut pacer = Pacer::new(&policy);

    let fresh = collector.poll(&mut pacer, SOURCE, CHANNEL, now).await?;

    assert_eq!(ids(&fresh), vec![b.message_id, c.message_id]);
    assert_eq!(
        cursors.snapshot().get(&cursor_key(SOURCE, CHANNEL)),
        Some(&c.message_id)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_later_polls_only_see_new_traffic() -> Result<(), Error> {
    let now = ts(2024, 3, 15, 12, 0, 0, 0);
    let b = message_at(ts(2024, 3, 15, 11, 30, 0, 0), 1, author(1, "kay"), "b");
    let c = message_at(ts(2024, 3, 15, 11, 45, 0, 0), 1, author(1, "kay"), "c");
    let policy = CallPolicy::default();
    let cursors = MemoryCursorRepository::new();

    // 1) First run sees the backlog inside the window.
    let fake = FakeHistory::new().with_messages(CHANNEL, vec![b.clone(), c.clone()]);
    let collector = IncrementalCollector::new(&fake, &cursors, &policy, 100, Duration::hours(1));
    let mut pacer = Pacer::new(&policy);
    let first = collector.poll(&mut pacer, SOURCE, CHANNEL, now).await?;
    assert_eq!(first.len(), 2);

    // 2) Two more messages land; the next run returns exactly those.
    let d = message_at(ts(2024, 3, 15, 11, 50, 0, 0), 1, author(1, "kay"), "d");
    let e = message_at(ts(2024, 3, 15, 11, 55, 0, 0), 1, author(1, "kay"), "e");
    let fake = FakeHistory::new().with_messages(
        CHANNEL,
        vec![b.clone(), c.clone(), d.clone(), e.clone()],
    );
    let collector = IncrementalCollector::new(&fake, &cursors, &policy, 100, Duration::hours(1));
    let mut pacer = Pacer::new(&policy);
    let second = collector.poll(&mut pacer, SOURCE, CHANNEL, now).await?;
    assert_eq!(ids(&second), vec![d.message_id, e.message_id]);
    assert_eq!(
        cursors.snapshot().get(&cursor_key(SOURCE, CHANNEL)),
        Some(&e.message_id)
    );

    // 3) Nothing new: empty result, cursor stays put.
    let mut pacer = Pacer::new(&policy);
    let third = collector.poll(&mut pacer, SOURCE, CHANNEL, now).await?;
    assert!(third.is_empty());
    assert_eq!(
        cursors.snapshot().get(&cursor_key(SOURCE, CHANNEL)),
        Some(&e.message_id)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stale_backlog_advances_cursor_without_output() -> Result<(), Error> {
    // Cursor parked a day back; everything since is older than the window.
    let now = ts(2024, 3, 15, 12, 0, 0, 0);
    let parked = id_at(ts(2024, 3, 14, 12, 0, 0, 0), 0);
    let s1 = message_at(ts(2024, 3, 14, 13, 0, 0, 0), 1, author(1, "kay"), "s1");
    let s2 = message_at(ts(2024, 3, 14, 14, 0, 0, 0), 1, author(1, "kay"), "s2");
    let s3 = message_at(ts(2024, 3, 14, 15, 0, 0, 0), 1, author(1, "kay"), "s3");
    let fake =
        FakeHistory::new().with_messages(CHANNEL, vec![s1.clone(), s2.clone(), s3.clone()]);
    let cursors = MemoryCursorRepository::new();
    cursors.seed(&cursor_key(SOURCE, CHANNEL), parked);
    let policy = CallPolicy::default();
    let collector = IncrementalCollector::new(&fake, &cursors, &policy, 100, Duration::hours(1));

    let mut pacer = Pacer::new(&policy);
    let first = collector.poll(&mut pacer, SOURCE, CHANNEL, now).await?;

    // The stale page yields nothing but still moves the cursor, so the
    // next poll skips it entirely.
    assert!(first.is_empty());
    assert_eq!(
        cursors.snapshot().get(&cursor_key(SOURCE, CHANNEL)),
        Some(&s3.message_id)
    );

    let mut pacer = Pacer::new(&policy);
    let second = collector.poll(&mut pacer, SOURCE, CHANNEL, now).await?;
    assert!(second.is_empty());
    assert_eq!(fake.page_call_count(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_poll_takes_one_page_at_a_time() -> Result<(), Error> {
    let now = ts(2024, 3, 15, 12, 0, 0, 0);
    let mut msgs = Vec::new();
    for i in 0..150 {
        let at = ts(2024, 3, 15, 11, 10, 0, 0) + Duration::seconds(i * 10);
        msgs.push(message_at(at, 0, author(1, "kay"), &format!("m{i}")));
    }
    let fake = FakeHistory::new().with_messages(CHANNEL, msgs);
    let cursors = MemoryCursorRepository::new();
    let policy = CallPolicy::default();
    let collector = IncrementalCollector::new(&fake, &cursors, &policy, 100, Duration::hours(1));

    let mut pacer = Pacer::new(&policy);
    let first = collector.poll(&mut pacer, SOURCE, CHANNEL, now).await?;
    let second = collector.poll(&mut pacer, SOURCE, CHANNEL, now).await?;

    // The backlog drains across polls without overlap.
    assert_eq!(first.len(), 100);
    assert_eq!(second.len(), 50);
    assert!(first.last().unwrap().message_id < second[0].message_id);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_vanished_channel_is_an_empty_poll() -> Result<(), Error> {
    let now = ts(2024, 3, 15, 12, 0, 0, 0);
    let scripted = ScriptedHistory::new(vec![Err(Error::NotFound("channel 777".to_string()))]);
    let cursors = MemoryCursorRepository::new();
    let policy = CallPolicy::default();
    let collector =
        IncrementalCollector::new(&scripted, &cursors, &policy, 100, Duration::hours(1));

    let mut pacer = Pacer::new(&policy);
    let fresh = collector.poll(&mut pacer, SOURCE, CHANNEL, now).await?;

    assert!(fresh.is_empty());
    assert!(cursors.snapshot().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cursors_track_channels_independently() -> Result<(), Error> {
    assert_eq!(cursor_key("disc", Snowflake(42)), "disc-42");

    let now = ts(2024, 3, 15, 12, 0, 0, 0);
    let in_first = message_at(ts(2024, 3, 15, 11, 20, 0, 0), 1, author(1, "kay"), "a");
    let in_second = message_at(ts(2024, 3, 15, 11, 40, 0, 0), 1, author(2, "mira"), "b");
    let fake = FakeHistory::new()
        .with_messages(Snowflake(111), vec![in_first.clone()])
        .with_messages(Snowflake(222), vec![in_second.clone()]);
    let cursors = MemoryCursorRepository::new();
    let policy = CallPolicy::default();
    let collector = IncrementalCollector::new(&fake, &cursors, &policy, 100, Duration::hours(1));

    let mut pacer = Pacer::new(&policy);
    collector.poll(&mut pacer, SOURCE, Snowflake(111), now).await?;
    collector.poll(&mut pacer, SOURCE, Snowflake(222), now).await?;

    let snapshot = cursors.snapshot();
    assert_eq!(snapshot.get("disc-111"), Some(&in_first.message_id));
    assert_eq!(snapshot.get("disc-222"), Some(&in_second.message_id));
    Ok(())
}
