use std::fmt;
use std::sync::Arc;

use board_watch_util_error::FmtCompact as _;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::extractor::Extractor;
use crate::fetcher::{FetchError, Fetcher};
use crate::notifier::{DestinationError, Notifier};
use crate::post::Post;
use crate::watermark::{Watermark, WatermarkReader};

const LOG_TARGET: &str = "board_watch::poll";

/// How a single poll cycle ended.
#[derive(Debug)]
pub enum PollOutcome {
    DestinationUnresolved(DestinationError),
    FetchFailed(FetchError),
    NoPostFound,
    /// First post seen since start, recorded without notifying.
    BaselineEstablished(Post),
    NewPost(Post),
    Unchanged,
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollOutcome::DestinationUnresolved(_) => f.write_str("destination unresolved"),
            PollOutcome::FetchFailed(_) => f.write_str("fetch failed"),
            PollOutcome::NoPostFound => f.write_str("no post found"),
            PollOutcome::BaselineEstablished(_) => f.write_str("baseline established"),
            PollOutcome::NewPost(_) => f.write_str("new post"),
            PollOutcome::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Fetch, extract, compare, notify. At most one cycle runs at a time.
pub struct PollCycle {
    target_url: Url,
    fetcher: Arc<dyn Fetcher>,
    extractor: Extractor,
    notifier: Arc<dyn Notifier>,
    watermark: Watermark,
    running: Mutex<()>,
}

impl PollCycle {
    pub fn new(
        target_url: Url,
        fetcher: Arc<dyn Fetcher>,
        extractor: Extractor,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            target_url,
            fetcher,
            extractor,
            notifier,
            watermark: Watermark::new(),
            running: Mutex::new(()),
        }
    }

    pub fn watermark(&self) -> WatermarkReader {
        self.watermark.reader()
    }

    /// Run one cycle unless another one is still in flight.
    ///
    /// Returns `None` when the tick was dropped.
    pub async fn tick(&self) -> Option<PollOutcome> {
        let Ok(_running) = self.running.try_lock() else {
            debug!(target: LOG_TARGET, "Previous cycle still running, dropping tick");
            return None;
        };

        let outcome = self.run_cycle().await;
        info!(target: LOG_TARGET, %outcome, "Poll cycle complete");
        Some(outcome)
    }

    #[instrument(name = "poll-cycle", skip(self), fields(url = %self.target_url))]
    async fn run_cycle(&self) -> PollOutcome {
        let destination = match self.notifier.resolve_destination().await {
            Ok(destination) => destination,
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Could not resolve notification destination, skipping cycle");
                return PollOutcome::DestinationUnresolved(err);
            }
        };

        let markup = match self.fetcher.fetch(&self.target_url).await {
            Ok(markup) => markup,
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to fetch listing page");
                return PollOutcome::FetchFailed(err);
            }
        };

        let Some(post) = self
            .extractor
            .extract(&markup, &self.target_url, self.fetcher.as_ref())
            .await
        else {
            return PollOutcome::NoPostFound;
        };

        match self.watermark.get() {
            None => {
                info!(target: LOG_TARGET, %post, "Baseline established");
                self.watermark.set(post.link.clone());
                PollOutcome::BaselineEstablished(post)
            }
            Some(last) if last == post.link => {
                debug!(target: LOG_TARGET, link = %last, "No new post");
                PollOutcome::Unchanged
            }
            Some(last) => {
                info!(target: LOG_TARGET, %post, previous = %last, "New post detected");
                if let Err(err) = self.notifier.notify(&destination, &post).await {
                    warn!(target: LOG_TARGET, err = %err.fmt_compact(), %destination, "Failed to deliver notification");
                }
                // Advances even when delivery failed.
                self.watermark.set(post.link.clone());
                PollOutcome::NewPost(post)
            }
        }
    }
}
