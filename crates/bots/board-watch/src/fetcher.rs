use std::time::Duration;

use reqwest::Client;
use snafu::{ResultExt as _, Snafu};
use tracing::debug;
use url::Url;

const LOG_TARGET: &str = "board_watch::fetch";

/// Forums tend to serve an empty shell or a captcha to obvious bots.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Snafu)]
pub enum FetchError {
    #[snafu(display("Request to {url} failed: {source}"))]
    Network { url: Url, source: reqwest::Error },
    #[snafu(display("Request to {url} returned HTTP {code}"))]
    HttpStatus { url: Url, code: u16 },
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Retrieves raw markup of a page. One attempt per call, no retries.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchResult<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        debug!(target: LOG_TARGET, %url, "Fetching page");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context(NetworkSnafu { url: url.clone() })?;

        let status = response.status();
        if !status.is_success() {
            return HttpStatusSnafu {
                url: url.clone(),
                code: status.as_u16(),
            }
            .fail();
        }

        let body = response
            .text()
            .await
            .context(NetworkSnafu { url: url.clone() })?;

        debug!(target: LOG_TARGET, %url, len = body.len(), "Fetched page");
        Ok(body)
    }
}
