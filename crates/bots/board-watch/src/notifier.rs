use std::fmt;
use std::time::Duration;

use snafu::Snafu;

use crate::post::Post;

pub const LEAD_IN: &str = "📢 A new post is up on the board!";
pub const BANNER: &str = "🆕 New post alert";
pub const LINK_LABEL: &str = "🔗 Link";

/// Chat channel that receives notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub channel_id: u64,
    pub name: Option<String>,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "#{name} ({})", self.channel_id),
            None => write!(f, "{}", self.channel_id),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DestinationError {
    #[snafu(display("No destination channel configured"))]
    NotConfigured,
    #[snafu(display("Destination channel id is not a valid id: {raw}"))]
    InvalidId { raw: String },
    #[snafu(display("Destination channel {channel_id} lookup failed"))]
    Lookup { channel_id: u64, source: NotifyError },
}

pub type DestinationResult<T> = std::result::Result<T, DestinationError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum NotifyError {
    #[snafu(display("Chat API request failed: {source}"))]
    Transport { source: reqwest::Error },
    #[snafu(display("Chat API returned {status}: {body}"))]
    Status { status: u16, body: String },
    #[snafu(display("Rate limited by chat API, retry after {retry_after_secs}s"))]
    RateLimited { retry_after_secs: u64 },
}

pub type NotifyResult<T> = std::result::Result<T, NotifyError>;

/// Delivery side of the bot: where to send, and sending.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn resolve_destination(&self) -> DestinationResult<Destination>;

    async fn notify(&self, destination: &Destination, post: &Post) -> NotifyResult<()>;
}

/// Platform-neutral content of a new-post alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPostMessage {
    pub lead_in: String,
    pub banner: String,
    /// Post title, already emphasized.
    pub headline: String,
    pub link_label: String,
    pub link: String,
    pub footer: String,
}

impl NewPostMessage {
    pub fn new(post: &Post, poll_interval: Duration) -> Self {
        Self {
            lead_in: LEAD_IN.to_string(),
            banner: BANNER.to_string(),
            headline: format!("**{}**", post.title),
            link_label: LINK_LABEL.to_string(),
            link: post.link.to_string(),
            footer: format!("Checked every {} seconds", poll_interval.as_secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    #[test]
    fn message_carries_title_link_and_cadence() {
        let post = Post::new(
            "Weekly meetup",
            Url::parse("https://cafe.example.com/ArticleRead.nhn?articleid=5").unwrap(),
        );
        let msg = NewPostMessage::new(&post, Duration::from_secs(60));

        assert_eq!(msg.banner, BANNER);
        assert_eq!(msg.headline, "**Weekly meetup**");
        assert_eq!(
            msg.link,
            "https://cafe.example.com/ArticleRead.nhn?articleid=5"
        );
        assert_eq!(msg.footer, "Checked every 60 seconds");
    }

    #[test]
    fn destination_display() {
        let named = Destination {
            channel_id: 42,
            name: Some("news".into()),
        };
        assert_eq!(named.to_string(), "#news (42)");
        assert_eq!(
            Destination {
                channel_id: 7,
                name: None
            }
            .to_string(),
            "7"
        );
    }
}
