use board_watch_util_error::FmtCompact as _;
use scraper::{ElementRef, Html, Selector};
use snafu::Snafu;
use tracing::{debug, trace, warn};
use url::Url;

use crate::fetcher::Fetcher;
use crate::post::Post;

const LOG_TARGET: &str = "board_watch::extract";

/// Anchors of the article list on the board page.
pub const ARTICLE_LIST_SELECTOR: &str = "div.article-board a.article";
/// Legacy layout: the list lives in a separate document behind this frame.
pub const EMBEDDED_FRAME_SELECTOR: &str = "iframe#cafe_main";
/// Article links on the board are site-relative and start with this.
pub const ARTICLE_READ_PREFIX: &str = "/ArticleRead.nhn";

#[derive(Debug, Snafu)]
pub enum ExtractorError {
    #[snafu(display("Invalid CSS selector: {selector}"))]
    InvalidSelector { selector: String },
}

pub type ExtractorResult<T> = std::result::Result<T, ExtractorError>;

fn parse_selector(selector: &str) -> ExtractorResult<Selector> {
    Selector::parse(selector).map_err(|_| ExtractorError::InvalidSelector {
        selector: selector.to_string(),
    })
}

/// What a single strategy made of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Found(Post),
    /// The listing is elsewhere, fetch this document and look there.
    FollowFrame(Url),
    Miss,
}

pub trait SelectorStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, document: &Html, page_url: &Url) -> Attempt;
}

/// Turn an article href into an absolute link.
///
/// Read-article paths are site-relative and get the origin of `page_url`
/// prepended; anything else is expected to already be absolute. Hrefs that
/// are neither are resolved against `page_url` as a last resort.
pub fn normalize_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    if href.starts_with(ARTICLE_READ_PREFIX) {
        let origin = page_url.origin().ascii_serialization();
        return Url::parse(&format!("{origin}{href}")).ok();
    }

    Url::parse(href).or_else(|_| page_url.join(href)).ok()
}

fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct ArticleListStrategy {
    anchor: Selector,
}

impl ArticleListStrategy {
    pub fn new() -> ExtractorResult<Self> {
        Ok(Self {
            anchor: parse_selector(ARTICLE_LIST_SELECTOR)?,
        })
    }
}

impl SelectorStrategy for ArticleListStrategy {
    fn name(&self) -> &'static str {
        "article-list"
    }

    fn attempt(&self, document: &Html, page_url: &Url) -> Attempt {
        for anchor in document.select(&self.anchor) {
            let Some(link) = anchor
                .value()
                .attr("href")
                .and_then(|href| normalize_link(href, page_url))
            else {
                trace!(target: LOG_TARGET, "Skipping anchor without usable href");
                continue;
            };

            let mut title = visible_text(anchor);
            if title.is_empty() {
                // Image-only anchors still mark the newest post.
                title = link.to_string();
            }
            return Attempt::Found(Post { title, link });
        }
        Attempt::Miss
    }
}

pub struct EmbeddedFrameStrategy {
    frame: Selector,
}

impl EmbeddedFrameStrategy {
    pub fn new() -> ExtractorResult<Self> {
        Ok(Self {
            frame: parse_selector(EMBEDDED_FRAME_SELECTOR)?,
        })
    }
}

impl SelectorStrategy for EmbeddedFrameStrategy {
    fn name(&self) -> &'static str {
        "embedded-frame"
    }

    fn attempt(&self, document: &Html, page_url: &Url) -> Attempt {
        document
            .select(&self.frame)
            .filter_map(|frame| frame.value().attr("src"))
            .map(str::trim)
            .find(|src| !src.is_empty())
            .and_then(|src| page_url.join(src).ok())
            .map_or(Attempt::Miss, Attempt::FollowFrame)
    }
}

/// Finds the newest post on a listing page by trying strategies in order.
pub struct Extractor {
    strategies: Vec<Box<dyn SelectorStrategy>>,
}

impl Extractor {
    /// Article list first, embedded frame as the fallback.
    pub fn new() -> ExtractorResult<Self> {
        Ok(Self::with_strategies(vec![
            Box::new(ArticleListStrategy::new()?),
            Box::new(EmbeddedFrameStrategy::new()?),
        ]))
    }

    pub fn with_strategies(strategies: Vec<Box<dyn SelectorStrategy>>) -> Self {
        Self { strategies }
    }

    /// Apply all strategies to `markup` without any I/O.
    ///
    /// A direct match always wins over a frame reference, even if the frame
    /// strategy comes first.
    pub fn attempt(&self, markup: &str, page_url: &Url) -> Attempt {
        let document = Html::parse_document(markup);
        let mut frame = None;

        for strategy in &self.strategies {
            match strategy.attempt(&document, page_url) {
                Attempt::Found(post) => {
                    debug!(target: LOG_TARGET, strategy = strategy.name(), %post, "Strategy matched");
                    return Attempt::Found(post);
                }
                Attempt::FollowFrame(url) => {
                    trace!(target: LOG_TARGET, strategy = strategy.name(), %url, "Strategy found frame");
                    frame.get_or_insert(url);
                }
                Attempt::Miss => {
                    trace!(target: LOG_TARGET, strategy = strategy.name(), "Strategy missed");
                }
            }
        }

        frame.map_or(Attempt::Miss, Attempt::FollowFrame)
    }

    /// Locate the newest post, following at most one embedded frame.
    ///
    /// `None` means the page did not have the expected shape. That is logged
    /// here and is not an error for the caller.
    pub async fn extract(
        &self,
        markup: &str,
        page_url: &Url,
        fetcher: &dyn Fetcher,
    ) -> Option<Post> {
        let frame_url = match self.attempt(markup, page_url) {
            Attempt::Found(post) => return Some(post),
            Attempt::Miss => {
                warn!(target: LOG_TARGET, url = %page_url, "No post found on page, markup may have changed");
                return None;
            }
            Attempt::FollowFrame(frame_url) => frame_url,
        };

        debug!(target: LOG_TARGET, url = %frame_url, "Following embedded listing");
        let sub_markup = match fetcher.fetch(&frame_url).await {
            Ok(markup) => markup,
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to fetch embedded listing");
                return None;
            }
        };

        match self.attempt(&sub_markup, &frame_url) {
            Attempt::Found(post) => Some(post),
            Attempt::FollowFrame(_) | Attempt::Miss => {
                warn!(target: LOG_TARGET, url = %frame_url, "No post found in embedded listing");
                None
            }
        }
    }
}
