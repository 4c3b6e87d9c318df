// File: src/services/window_collector.rs

//! Collects every message in one channel for one calendar day by anchoring
//! a page at the start-of-day id, then sweeping backward and forward until
//! both day edges are passed.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use snowrake_common::models::config::{CallPolicy, CollectionDetail};
use snowrake_common::models::message::RawMessage;
use snowrake_common::models::snowflake::Snowflake;

use crate::pacing::{call_with_retries, Pacer};
use crate::platforms::{ChannelHistoryApi, PageAnchor};
use crate::services::context::CollectedWindow;
use crate::services::media_extractor;
use crate::utils::time::day_bounds;
use crate::Error;

/// Phases of one channel-day collection, strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Anchoring,
    SweepBackward,
    SweepForward,
    Done,
}

/// Sweep direction; both directions share one stop rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

pub struct WindowCollector<'a> {
    api: &'a dyn ChannelHistoryApi,
    policy: &'a CallPolicy,
    page_size: u8,
    detail: CollectionDetail,
}

impl<'a> WindowCollector<'a> {
    pub fn new(
        api: &'a dyn ChannelHistoryApi,
        policy: &'a CallPolicy,
        page_size: u8,
        detail: CollectionDetail,
    ) -> Self {
        Self {
            api,
            policy,
            page_size,
            detail,
        }
    }

    /// Returns the channel's messages for `date`, deduplicated and ascending
    /// by creation time. Zero messages on the date is a valid, empty result.
    pub async fn collect(
        &self,
        channel_id: Snowflake,
        date: NaiveDate,
    ) -> Result<Vec<RawMessage>, Error> {
        let (day_start, day_end) = day_bounds(date);
        let mut window = CollectedWindow::new();
        let mut pacer = Pacer::new(self.policy);
        let mut phase = Phase::Anchoring;

        while phase != Phase::Done {
            phase = match phase {
                Phase::Anchoring => {
                    pacer.pace().await;
                    let anchor = Snowflake::from_datetime(day_start);
                    let page = self.fetch_page(channel_id, PageAnchor::Around(anchor)).await?;
                    self.absorb(&mut window, &page, day_start, day_end);
                    if page.is_empty() {
                        // Nothing anywhere near the day; no sweeps to run.
                        debug!("Channel {channel_id}: empty anchor page for {date}");
                        Phase::Done
                    } else {
                        Phase::SweepBackward
                    }
                }
                Phase::SweepBackward => {
                    let stop = self
                        .sweep_step(
                            &mut pacer,
                            &mut window,
                            channel_id,
                            Direction::Backward,
                            day_start,
                            day_end,
                        )
                        .await?;
                    if stop {
                        Phase::SweepForward
                    } else {
                        Phase::SweepBackward
                    }
                }
                Phase::SweepForward => {
                    let stop = self
                        .sweep_step(
                            &mut pacer,
                            &mut window,
                            channel_id,
                            Direction::Forward,
                            day_start,
                            day_end,
                        )
                        .await?;
                    if stop {
                        Phase::Done
                    } else {
                        Phase::SweepForward
                    }
                }
                Phase::Done => Phase::Done,
            };
        }

        let collected = window.into_sorted();
        info!(
            "Channel {channel_id}: collected {} messages for {date}",
            collected.len()
        );
        Ok(collected)
    }

    /// One paginated fetch in the given direction, anchored at the current
    /// sentinel. Returns whether the sweep is finished.
    async fn sweep_step(
        &self,
        pacer: &mut Pacer,
        window: &mut CollectedWindow,
        channel_id: Snowflake,
        dir: Direction,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let sentinel = match dir {
            Direction::Backward => window.earliest_seen(),
            Direction::Forward => window.latest_seen(),
        };
        let Some(sentinel) = sentinel else {
            return Ok(true);
        };

        pacer.pace().await;
        let anchor = match dir {
            Direction::Backward => PageAnchor::Before(sentinel),
            Direction::Forward => PageAnchor::After(sentinel),
        };
        let page = self.fetch_page(channel_id, anchor).await?;
        self.absorb(window, &page, day_start, day_end);

        Ok(sweep_should_stop(dir, &page, window, day_start, day_end))
    }

    async fn fetch_page(
        &self,
        channel_id: Snowflake,
        anchor: PageAnchor,
    ) -> Result<Vec<RawMessage>, Error> {
        let fetched = call_with_retries(self.policy, "fetch_page", || {
            self.api.fetch_page(channel_id, anchor, self.page_size)
        })
        .await;

        match fetched {
            Ok(page) => Ok(page),
            // No data at this anchor; same as an empty page.
            Err(Error::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Feeds one raw page into the accumulator. Sentinels advance over every
    /// raw id; the message list only takes unseen, in-window messages that
    /// survive the detail filter. Within-page ordering is never relied on.
    fn absorb(
        &self,
        window: &mut CollectedWindow,
        page: &[RawMessage],
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) {
        for msg in page {
            window.note_seen_id(msg.message_id);
        }
        for msg in page {
            if msg.created_at < day_start || msg.created_at > day_end {
                continue;
            }
            if !media_extractor::retained(msg, self.detail) {
                continue;
            }
            window.insert(msg.clone());
        }
    }
}

/// The one stop rule, applied identically in both directions: an empty page,
/// any message past the day edge, or a sentinel id past the day edge all
/// finish the sweep.
fn sweep_should_stop(
    dir: Direction,
    page: &[RawMessage],
    window: &CollectedWindow,
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
) -> bool {
    if page.is_empty() {
        return true;
    }
    match dir {
        Direction::Backward => {
            page.iter().any(|m| m.created_at < day_start)
                || window
                    .earliest_seen()
                    .is_some_and(|id| id < Snowflake::from_datetime(day_start))
        }
        Direction::Forward => {
            page.iter().any(|m| m.created_at > day_end)
                || window
                    .latest_seen()
                    .is_some_and(|id| id > Snowflake::from_datetime(day_end))
        }
    }
}
