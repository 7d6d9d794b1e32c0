use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::watermark::WatermarkReader;

const NONE_YET: &str = "none yet";
const NOT_CONFIGURED: &str = "not configured";

/// Everything needed to answer a status query, shared with the health server.
#[derive(Clone)]
pub struct StatusSource {
    pub target_url: Url,
    pub destination: Option<String>,
    pub poll_interval: Duration,
    pub watermark: WatermarkReader,
}

impl StatusSource {
    pub fn report(&self) -> StatusReport {
        StatusReport {
            target_url: self.target_url.to_string(),
            last_link: self.watermark.get().map(|link| link.to_string()),
            destination: self.destination.clone(),
            poll_interval_secs: self.poll_interval.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub target_url: String,
    pub last_link: Option<String>,
    pub destination: Option<String>,
    pub poll_interval_secs: u64,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Watching: {}", self.target_url)?;
        writeln!(
            f,
            "Last post: {}",
            self.last_link.as_deref().unwrap_or(NONE_YET)
        )?;
        writeln!(
            f,
            "Destination: {}",
            self.destination.as_deref().unwrap_or(NOT_CONFIGURED)
        )?;
        write!(f, "Interval: {}s", self.poll_interval_secs)
    }
}
