//! Browser backends implementing [`BrowserSession`](crate::traits::BrowserSession).

pub mod chromium;

pub use chromium::ChromiumSession;

use crate::config::{BrowserEngine, ScrapeOptions};
use crate::error::{ScrapeError, ScrapeResult};

/// Launch a fresh session for the configured engine.
///
/// Each scrape gets its own session; sessions are never shared.
pub async fn launch(options: &ScrapeOptions) -> ScrapeResult<ChromiumSession> {
    match options.browser_engine {
        BrowserEngine::Chrome => ChromiumSession::launch(options).await,
        BrowserEngine::Firefox => Err(ScrapeError::UnsupportedEngine(BrowserEngine::Firefox)),
    }
}
