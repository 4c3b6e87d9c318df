// File: src/platforms/discord/client.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use snowrake_common::models::channel::ChannelDescriptor;
use snowrake_common::models::message::RawMessage;
use snowrake_common::models::snowflake::Snowflake;

use super::wire::{ApiErrorJson, ChannelJson, MemberJson, MessageJson, RoleJson};
use crate::platforms::{ChannelHistoryApi, MemberInfo, PageAnchor, RoleInfo};
use crate::Error;

const API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = "DiscordBot (https://github.com/snowrake/snowrake, 0.1)";

/// Bot-token REST client for the history, channel, member and role
/// endpoints. Pacing and retries live in the callers; this client only
/// classifies failures.
pub struct DiscordRestClient {
    bot_token: String,
    http_client: Client,
}

impl DiscordRestClient {
    pub fn new(bot_token: &str) -> Result<Self, Error> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            bot_token: bot_token.to_string(),
            http_client: client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let resp = self
            .http_client
            .get(url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .send()
            .await?;

        let status = resp.status();
        log_rate_headers(&resp);

        if !status.is_success() {
            let retry_after = header_f64(&resp, "Retry-After");
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status, retry_after, &body, url));
        }

        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl ChannelHistoryApi for DiscordRestClient {
    async fn fetch_page(
        &self,
        channel_id: Snowflake,
        anchor: PageAnchor,
        limit: u8,
    ) -> Result<Vec<RawMessage>, Error> {
        let (param, id) = anchor.query_param();
        let url = format!("{API_BASE}/channels/{channel_id}/messages?{param}={id}&limit={limit}");
        let page: Vec<MessageJson> = self.get_json(&url).await?;
        debug!(
            "Channel {channel_id}: fetched {} messages ({param}={id})",
            page.len()
        );
        page.into_iter().map(MessageJson::into_model).collect()
    }

    async fn fetch_channel(&self, channel_id: Snowflake) -> Result<ChannelDescriptor, Error> {
        let cj: ChannelJson = self
            .get_json(&format!("{API_BASE}/channels/{channel_id}"))
            .await?;

        // One hop to the parent names the category (or parent forum for
        // threads). Losing it is not worth failing the channel over.
        let category = match cj.parent_id {
            Some(parent_id) => {
                match self
                    .get_json::<ChannelJson>(&format!("{API_BASE}/channels/{parent_id}"))
                    .await
                {
                    Ok(parent) => parent.name,
                    Err(e) => {
                        warn!("Failed to fetch parent channel {parent_id} => {e}");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(cj.into_descriptor(category))
    }

    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> Result<MemberInfo, Error> {
        let mj: MemberJson = self
            .get_json(&format!("{API_BASE}/guilds/{guild_id}/members/{user_id}"))
            .await?;
        Ok(mj.into_member_info())
    }

    async fn fetch_roles(&self, guild_id: Snowflake) -> Result<Vec<RoleInfo>, Error> {
        let roles: Vec<RoleJson> = self
            .get_json(&format!("{API_BASE}/guilds/{guild_id}/roles"))
            .await?;
        Ok(roles.into_iter().map(RoleJson::into_role_info).collect())
    }
}

fn log_rate_headers(resp: &reqwest::Response) {
    let remaining = header_str(resp, "X-RateLimit-Remaining");
    let reset_after = header_str(resp, "X-RateLimit-Reset-After");
    if let (Some(remaining), Some(reset_after)) = (remaining, reset_after) {
        debug!("Rate budget: {remaining} calls left, window resets in {reset_after}s");
    }
}

fn header_str<'a>(resp: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

fn header_f64(resp: &reqwest::Response, name: &str) -> Option<f64> {
    header_str(resp, name).and_then(|v| v.parse::<f64>().ok())
}

/// Maps one failed response onto the error taxonomy: 401/403 are permission
/// failures, 404 is not-found, 429 carries the advised wait, anything else
/// is a plain API error.
fn classify_failure(
    status: StatusCode,
    header_retry_after: Option<f64>,
    body: &str,
    url: &str,
) -> Error {
    let parsed: ApiErrorJson = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        body.chars().take(200).collect()
    } else {
        parsed.message
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::PermissionDenied(format!("{url} => HTTP {status}: {message}"))
        }
        StatusCode::NOT_FOUND => Error::NotFound(format!("{url} => {message}")),
        StatusCode::TOO_MANY_REQUESTS => {
            let secs = parsed
                .retry_after
                .or(header_retry_after)
                .filter(|s| s.is_finite() && *s >= 0.0);
            Error::RateLimited {
                retry_after: secs.map(Duration::from_secs_f64),
            }
        }
        _ => Error::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_statuses() {
        let err = classify_failure(StatusCode::FORBIDDEN, None, r#"{"message":"Missing Access","code":50001}"#, "url");
        assert!(matches!(err, Error::PermissionDenied(msg) if msg.contains("Missing Access")));

        let err = classify_failure(StatusCode::NOT_FOUND, None, "", "url");
        assert!(matches!(err, Error::NotFound(_)));

        let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, None, "boom", "url");
        assert!(matches!(err, Error::Api { status: 500, .. }));
        assert!(err.retryable());
    }

    #[test]
    fn rate_limit_prefers_body_retry_after() {
        let err = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            Some(2.0),
            r#"{"message":"You are being rate limited.","retry_after":12.5}"#,
            "url",
        );
        assert_eq!(err.retry_after(), Some(Duration::from_secs_f64(12.5)));
    }

    #[test]
    fn rate_limit_without_advice_still_retryable() {
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, None, "", "url");
        assert!(err.retryable());
        assert_eq!(err.retry_after(), None);
    }
}
