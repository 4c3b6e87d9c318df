// File: src/services/source.rs

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use snowrake_common::models::batch::CollectedBatch;
use snowrake_common::models::channel::ChannelDescriptor;
use snowrake_common::models::config::DiscordSourceConfig;
use snowrake_common::models::message::RawMessage;
use snowrake_common::models::snowflake::Snowflake;
use snowrake_common::traits::repository_traits::CursorRepository;

use crate::pacing::{call_with_retries, Pacer};
use crate::platforms::discord::DiscordRestClient;
use crate::platforms::ChannelHistoryApi;
use crate::services::context::RunContext;
use crate::services::incremental_collector::IncrementalCollector;
use crate::services::user_resolver::UserResolver;
use crate::services::window_collector::WindowCollector;
use crate::services::{assembler, media_extractor};
use crate::Error;

/// Drives collection across every configured channel of one guild. A
/// failing channel is logged and skipped so the rest of the run survives
/// deleted channels and revoked permissions.
pub struct DiscordSource {
    api: Arc<dyn ChannelHistoryApi>,
    cursors: Arc<dyn CursorRepository>,
    config: DiscordSourceConfig,
}

impl DiscordSource {
    pub fn new(
        api: Arc<dyn ChannelHistoryApi>,
        cursors: Arc<dyn CursorRepository>,
        config: DiscordSourceConfig,
    ) -> Self {
        Self {
            api,
            cursors,
            config,
        }
    }

    /// Production wiring: a REST client authenticated with the configured
    /// bot token.
    pub fn from_config(
        config: DiscordSourceConfig,
        cursors: Arc<dyn CursorRepository>,
    ) -> Result<Self, Error> {
        let client = DiscordRestClient::new(&config.bot_token)?;
        Ok(Self::new(Arc::new(client), cursors, config))
    }

    pub fn source_name(&self) -> &str {
        &self.config.source_name
    }

    /// Collects one full UTC day from every configured channel. Channels
    /// with no traffic that day produce no batch.
    pub async fn collect_date(&self, date: NaiveDate) -> Result<Vec<CollectedBatch>, Error> {
        info!(
            "Collecting {date} across {} channels of '{}'",
            self.config.channel_ids.len(),
            self.config.source_name
        );

        let mut batches = Vec::new();
        for &channel_id in &self.config.channel_ids {
            match self.collect_channel_day(channel_id, date).await {
                Ok(Some(batch)) => {
                    info!(
                        "Channel {channel_id}: {} messages from {} users",
                        batch.messages.len(),
                        batch.users.len()
                    );
                    batches.push(batch);
                }
                Ok(None) => debug!("Channel {channel_id}: nothing on {date}"),
                Err(e) => warn!("Channel {channel_id}: collection failed => {e}; skipping"),
            }
        }
        Ok(batches)
    }

    async fn collect_channel_day(
        &self,
        channel_id: Snowflake,
        date: NaiveDate,
    ) -> Result<Option<CollectedBatch>, Error> {
        let descriptor = self.fetch_descriptor(channel_id).await?;

        let collector = WindowCollector::new(
            self.api.as_ref(),
            &self.config.call_policy,
            self.config.page_size,
            self.config.detail,
        );
        let messages = collector.collect(channel_id, date).await?;
        if messages.is_empty() {
            return Ok(None);
        }

        let mut ctx = RunContext::default();
        let resolver = UserResolver::new(
            self.api.as_ref(),
            &self.config.call_policy,
            self.config.guild_id,
            self.config.resolver_batch_width,
        );
        resolver.resolve_all(&mut ctx, &messages).await;

        let messages = label_thread_messages(&descriptor, messages);
        Ok(Some(assembler::assemble_daily(
            &self.config.source_name,
            descriptor,
            date,
            ctx.users,
            messages,
        )))
    }

    /// Polls every configured channel for traffic newer than its cursor.
    /// One pacer spans the whole poll loop, so back-to-back channels keep
    /// the configured call gap between them.
    pub async fn poll_recent(&self, now: DateTime<Utc>) -> Result<Vec<CollectedBatch>, Error> {
        let collector = IncrementalCollector::new(
            self.api.as_ref(),
            self.cursors.as_ref(),
            &self.config.call_policy,
            self.config.page_size,
            self.config.rolling_window(),
        );
        let mut pacer = Pacer::new(&self.config.call_policy);

        let mut batches = Vec::new();
        for &channel_id in &self.config.channel_ids {
            match self
                .poll_channel(&collector, &mut pacer, channel_id, now)
                .await
            {
                Ok(Some(batch)) => {
                    info!("Channel {channel_id}: {} new messages", batch.messages.len());
                    batches.push(batch);
                }
                Ok(None) => debug!("Channel {channel_id}: nothing new"),
                Err(e) => warn!("Channel {channel_id}: poll failed => {e}; skipping"),
            }
        }
        Ok(batches)
    }

    async fn poll_channel(
        &self,
        collector: &IncrementalCollector<'_>,
        pacer: &mut Pacer,
        channel_id: Snowflake,
        now: DateTime<Utc>,
    ) -> Result<Option<CollectedBatch>, Error> {
        // Descriptor before poll: the cursor must not advance for a channel
        // we could not describe, or its traffic would be skipped for good.
        pacer.pace().await;
        let descriptor = self.fetch_descriptor(channel_id).await?;

        let messages = collector
            .poll(pacer, &self.config.source_name, channel_id, now)
            .await?;
        let messages: Vec<RawMessage> = messages
            .into_iter()
            .filter(|m| media_extractor::retained(m, self.config.detail))
            .collect();
        if messages.is_empty() {
            return Ok(None);
        }

        let mut ctx = RunContext::default();
        let resolver = UserResolver::new(
            self.api.as_ref(),
            &self.config.call_policy,
            self.config.guild_id,
            self.config.resolver_batch_width,
        );
        resolver.resolve_all(&mut ctx, &messages).await;

        let messages = label_thread_messages(&descriptor, messages);
        Ok(Some(assembler::assemble_incremental(
            &self.config.source_name,
            descriptor,
            now,
            ctx.users,
            messages,
        )))
    }

    async fn fetch_descriptor(&self, channel_id: Snowflake) -> Result<ChannelDescriptor, Error> {
        call_with_retries(&self.config.call_policy, "fetch_channel", || {
            self.api.fetch_channel(channel_id)
        })
        .await
    }
}

/// Messages out of a thread carry the thread name, so flattened output
/// keeps its origin visible.
fn label_thread_messages(
    descriptor: &ChannelDescriptor,
    mut messages: Vec<RawMessage>,
) -> Vec<RawMessage> {
    if descriptor.kind.is_thread() {
        for msg in &mut messages {
            msg.thread_label = Some(descriptor.name.clone());
        }
    }
    messages
}
