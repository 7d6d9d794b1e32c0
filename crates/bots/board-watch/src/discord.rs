//! Minimal Discord REST client: just enough to check the bot token, look up
//! the destination channel and post alerts into it.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, ResultExt as _};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

use crate::notifier::{
    Destination, DestinationResult, InvalidIdSnafu, LookupSnafu, NewPostMessage, Notifier,
    NotConfiguredSnafu, NotifyResult, RateLimitedSnafu, StatusSnafu, TransportSnafu,
};
use crate::post::Post;

const LOG_TARGET: &str = "board_watch::discord";

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
const EMBED_COLOR: u32 = 0x03c7_5a;

pub struct DiscordClient {
    client: Client,
    api_base: String,
    token: String,
    channel_id: Option<String>,
    poll_interval: Duration,
}

/// The account behind the bot token.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct Channel {
    name: Option<String>,
}

impl DiscordClient {
    /// `channel_id` is kept raw so a bad value only degrades the destination
    /// lookup instead of preventing startup.
    pub fn new(
        api_base: &str,
        token: &str,
        channel_id: Option<String>,
        poll_interval: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            channel_id,
            poll_interval,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Check the token by asking who we are.
    pub async fn verify_credentials(&self) -> NotifyResult<BotUser> {
        let response = self
            .client
            .get(self.endpoint("/users/@me"))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .context(TransportSnafu)?;

        let user: BotUser = check_response(response)
            .await?
            .json()
            .await
            .context(TransportSnafu)?;

        info!(target: LOG_TARGET, id = %user.id, username = %user.username, "Chat credentials verified");
        Ok(user)
    }

    async fn fetch_channel(&self, channel_id: u64) -> NotifyResult<Channel> {
        let response = self
            .client
            .get(self.endpoint(&format!("/channels/{channel_id}")))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .send()
            .await
            .context(TransportSnafu)?;

        check_response(response)
            .await?
            .json()
            .await
            .context(TransportSnafu)
    }
}

async fn check_response(response: Response) -> NotifyResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok())
            .map_or(DEFAULT_RETRY_AFTER_SECS, |secs| secs.ceil() as u64);

        warn!(target: LOG_TARGET, retry_after_secs, "Rate limited by Discord");
        return RateLimitedSnafu { retry_after_secs }.fail();
    }

    let body = response.text().await.unwrap_or_default();
    StatusSnafu {
        status: status.as_u16(),
        body,
    }
    .fail()
}

#[async_trait::async_trait]
impl Notifier for DiscordClient {
    async fn resolve_destination(&self) -> DestinationResult<Destination> {
        let raw = self
            .channel_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .context(NotConfiguredSnafu)?;

        let Ok(channel_id) = raw.parse::<u64>() else {
            return InvalidIdSnafu { raw }.fail();
        };

        let channel = self
            .fetch_channel(channel_id)
            .await
            .context(LookupSnafu { channel_id })?;

        Ok(Destination {
            channel_id,
            name: channel.name,
        })
    }

    async fn notify(&self, destination: &Destination, post: &Post) -> NotifyResult<()> {
        let message = NewPostMessage::new(post, self.poll_interval);
        let payload = DiscordMessage::from_message(&message, OffsetDateTime::now_utc());

        debug!(target: LOG_TARGET, %destination, %post, "Sending new post alert");

        let response = self
            .client
            .post(self.endpoint(&format!(
                "/channels/{}/messages",
                destination.channel_id
            )))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&payload)
            .send()
            .await
            .context(TransportSnafu)?;

        check_response(response).await?;
        Ok(())
    }
}

// =============================================================================
// Discord API types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct DiscordMessage {
    content: String,
    embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
    url: String,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    footer: DiscordFooter,
    fields: Vec<DiscordField>,
}

#[derive(Debug, Serialize)]
struct DiscordFooter {
    text: String,
}

#[derive(Debug, Serialize)]
struct DiscordField {
    name: String,
    value: String,
    inline: bool,
}

impl DiscordMessage {
    pub fn from_message(message: &NewPostMessage, sent_at: OffsetDateTime) -> Self {
        let embed = DiscordEmbed {
            title: message.banner.clone(),
            description: message.headline.clone(),
            url: message.link.clone(),
            color: EMBED_COLOR,
            timestamp: sent_at.format(&Rfc3339).ok(),
            footer: DiscordFooter {
                text: message.footer.clone(),
            },
            fields: vec![DiscordField {
                name: message.link_label.clone(),
                value: message.link.clone(),
                inline: false,
            }],
        };

        Self {
            content: message.lead_in.clone(),
            embeds: vec![embed],
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    #[test]
    fn payload_shape() {
        let post = Post::new(
            "Hello board",
            Url::parse("https://site/x/2").unwrap(),
        );
        let message = NewPostMessage::new(&post, Duration::from_secs(60));
        let payload = DiscordMessage::from_message(&message, OffsetDateTime::UNIX_EPOCH);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["content"], crate::notifier::LEAD_IN);
        let embed = &json["embeds"][0];
        assert_eq!(embed["title"], crate::notifier::BANNER);
        assert_eq!(embed["description"], "**Hello board**");
        assert_eq!(embed["url"], "https://site/x/2");
        assert_eq!(embed["timestamp"], "1970-01-01T00:00:00Z");
        assert_eq!(embed["footer"]["text"], "Checked every 60 seconds");
        assert_eq!(embed["fields"][0]["name"], crate::notifier::LINK_LABEL);
        assert_eq!(embed["fields"][0]["value"], "https://site/x/2");
    }
}
