//! Error types surfaced by a scrape.
//!
//! Only structural failures live here. Content-level irregularities (a card
//! that does not parse, a missing "load more" button, a load that never
//! arrives) are absorbed by the parser and the load-more driver.

use thiserror::Error;

use crate::config::BrowserEngine;

pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Neither a role nor a city was supplied
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// The search page did not resolve in time
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The browser session reported a failure
    #[error("browser session error: {0}")]
    Session(#[from] anyhow::Error),

    /// A CSS selector in the site configuration does not parse
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    /// An environment setting holds an unusable value
    #[error("invalid config value for {key}: {reason}")]
    Config { key: String, reason: String },

    #[error("browser engine {0} is not supported by this build")]
    UnsupportedEngine(BrowserEngine),
}
