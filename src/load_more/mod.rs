//! Load-more driver.
//!
//! Clicks the page's "load more" control and polls the rendered content until
//! the number of listing cards grows. States:
//!
//! - `Ready`: after navigation, with the initial card count known
//! - `Waiting`: a click was sent, polling for growth
//! - `Loaded`: growth observed, the new extraction is handed back
//! - `Exhausted`: control missing or disabled, or no growth before the timeout
//! - `Capped`: the configured click budget is spent
//!
//! `Exhausted` and `Capped` are terminal. Every wait is bounded.

use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::config::ScrapeOptions;
use crate::error::ScrapeResult;
use crate::extractor::{Extraction, PageExtractor};
use crate::traits::{BrowserSession, ListingParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMoreState {
    Ready,
    Waiting,
    Loaded,
    Exhausted,
    Capped,
}

impl LoadMoreState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted | Self::Capped)
    }
}

pub struct LoadMoreDriver<'a, S, P> {
    session: &'a mut S,
    extractor: &'a PageExtractor<P>,
    control_locator: &'a str,
    options: &'a ScrapeOptions,
    state: LoadMoreState,
    last_count: usize,
    invocations: usize,
}

impl<'a, S, P> LoadMoreDriver<'a, S, P>
where
    S: BrowserSession,
    P: ListingParser,
{
    /// A driver in `Ready` state; `initial_count` is the card count of the first pass
    pub fn new(
        session: &'a mut S,
        extractor: &'a PageExtractor<P>,
        control_locator: &'a str,
        options: &'a ScrapeOptions,
        initial_count: usize,
    ) -> Self {
        Self {
            session,
            extractor,
            control_locator,
            options,
            state: LoadMoreState::Ready,
            last_count: initial_count,
            invocations: 0,
        }
    }

    pub fn state(&self) -> LoadMoreState {
        self.state
    }

    /// Number of times the control has been clicked
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Click once and wait for the page to grow.
    ///
    /// Returns the extraction of the grown page, or `None` once a terminal
    /// state is reached. Only session failures are errors.
    pub async fn advance(&mut self) -> ScrapeResult<Option<Extraction>> {
        if self.state.is_terminal() {
            return Ok(None);
        }

        if self.invocations >= self.options.max_load_more_attempts {
            info!(
                "Reached maximum load-more attempts ({}), stopping",
                self.options.max_load_more_attempts
            );
            self.state = LoadMoreState::Capped;
            return Ok(None);
        }

        if self.invocations > 0 {
            sleep(self.options.pacing_delay).await;
        }

        let Some(control) = self.session.find_control(self.control_locator).await? else {
            info!("Load-more control not on page, all listings loaded");
            self.state = LoadMoreState::Exhausted;
            return Ok(None);
        };
        if !control.enabled {
            info!("Load-more control is disabled, all listings loaded");
            self.state = LoadMoreState::Exhausted;
            return Ok(None);
        }

        self.session.invoke(&control).await?;
        self.invocations += 1;
        self.state = LoadMoreState::Waiting;
        debug!("Clicked load-more ({} of at most {})", self.invocations, self.options.max_load_more_attempts);

        self.wait_for_growth().await
    }

    async fn wait_for_growth(&mut self) -> ScrapeResult<Option<Extraction>> {
        let deadline = Instant::now() + self.options.load_more_timeout;

        loop {
            sleep(self.options.poll_interval).await;

            let content = self.session.current_content().await?;
            let extraction = self.extractor.extract(&content);

            if extraction.fragment_count > self.last_count {
                info!(
                    "Loaded {} more cards ({} on page)",
                    extraction.fragment_count - self.last_count,
                    extraction.fragment_count
                );
                self.last_count = extraction.fragment_count;
                self.state = LoadMoreState::Loaded;
                return Ok(Some(extraction));
            }

            if Instant::now() >= deadline {
                info!(
                    "No new cards within {:?}, treating results as exhausted",
                    self.options.load_more_timeout
                );
                self.state = LoadMoreState::Exhausted;
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::parser::CardParser;
    use crate::scrapers::UsnlxSite;
    use crate::testing::MockSession;
    use crate::traits::JobSite;

    const LOCATOR: &str = r#"button[aria-label="Load more jobs"]"#;

    fn extractor() -> PageExtractor<CardParser> {
        PageExtractor::new(CardParser::from_config(UsnlxSite::new().config()).unwrap())
    }

    fn options(max: usize) -> ScrapeOptions {
        ScrapeOptions {
            max_load_more_attempts: max,
            ..ScrapeOptions::default()
        }
    }

    async fn prime(session: &mut MockSession, extractor: &PageExtractor<CardParser>) -> usize {
        session.navigate("https://usnlx.com/jobs/?q=x").await.unwrap();
        let html = session.current_content().await.unwrap();
        extractor.extract(&html).fragment_count
    }

    async fn drain(driver: &mut LoadMoreDriver<'_, MockSession, CardParser>) -> LoadMoreState {
        while driver.advance().await.unwrap().is_some() {}
        driver.state()
    }

    #[tokio::test(start_paused = true)]
    async fn test_capped_at_exactly_max_attempts() {
        let extractor = extractor();
        let options = options(4);
        let mut session = MockSession::growing(10, 5);
        let stats = session.stats();
        let initial = prime(&mut session, &extractor).await;

        let mut driver = LoadMoreDriver::new(&mut session, &extractor, LOCATOR, &options, initial);
        let end = drain(&mut driver).await;

        assert_eq!(end, LoadMoreState::Capped);
        assert_eq!(driver.invocations(), 4);
        assert_eq!(stats.invocations(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_caps_immediately() {
        let extractor = extractor();
        let options = options(0);
        let mut session = MockSession::growing(3, 3);
        let stats = session.stats();
        let initial = prime(&mut session, &extractor).await;

        let mut driver = LoadMoreDriver::new(&mut session, &extractor, LOCATOR, &options, initial);
        assert_eq!(drain(&mut driver).await, LoadMoreState::Capped);
        assert_eq!(stats.invocations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_control_is_exhaustion() {
        let extractor = extractor();
        let options = options(50);
        let mut session = MockSession::with_card_counts(&[20]).without_control();
        let stats = session.stats();
        let initial = prime(&mut session, &extractor).await;

        let mut driver = LoadMoreDriver::new(&mut session, &extractor, LOCATOR, &options, initial);
        assert_eq!(driver.state(), LoadMoreState::Ready);
        assert!(driver.advance().await.unwrap().is_none());
        assert_eq!(driver.state(), LoadMoreState::Exhausted);
        assert_eq!(stats.invocations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_control_is_exhaustion() {
        let extractor = extractor();
        let options = options(50);
        let mut session = MockSession::with_card_counts(&[5, 10]).with_disabled_control();
        let initial = prime(&mut session, &extractor).await;

        let mut driver = LoadMoreDriver::new(&mut session, &extractor, LOCATOR, &options, initial);
        assert_eq!(drain(&mut driver).await, LoadMoreState::Exhausted);
        assert_eq!(driver.invocations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_growth_is_exhaustion() {
        let extractor = extractor();
        let options = options(50);
        let mut session = MockSession::with_card_counts(&[20]);
        let stats = session.stats();
        let initial = prime(&mut session, &extractor).await;

        let started = Instant::now();
        let mut driver = LoadMoreDriver::new(&mut session, &extractor, LOCATOR, &options, initial);
        assert!(driver.advance().await.unwrap().is_none());

        assert_eq!(driver.state(), LoadMoreState::Exhausted);
        assert_eq!(stats.invocations(), 1);
        assert!(started.elapsed() >= options.load_more_timeout);
        assert!(started.elapsed() < options.load_more_timeout + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_render_is_waited_for() {
        let extractor = extractor();
        let options = options(50);
        let mut session = MockSession::with_card_counts(&[20, 35]).with_render_delay(6);
        let initial = prime(&mut session, &extractor).await;

        let mut driver = LoadMoreDriver::new(&mut session, &extractor, LOCATOR, &options, initial);
        let extraction = driver.advance().await.unwrap().unwrap();

        assert_eq!(driver.state(), LoadMoreState::Loaded);
        assert_eq!(extraction.fragment_count, 35);
        assert_eq!(extraction.listings.len(), 35);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clicks_are_paced() {
        let extractor = extractor();
        let options = ScrapeOptions {
            max_load_more_attempts: 3,
            pacing_delay: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
            ..ScrapeOptions::default()
        };
        let mut session = MockSession::growing(5, 5);
        let initial = prime(&mut session, &extractor).await;

        let started = Instant::now();
        let mut driver = LoadMoreDriver::new(&mut session, &extractor, LOCATOR, &options, initial);
        drain(&mut driver).await;

        // two pacing gaps between three clicks, plus one poll per click
        assert!(started.elapsed() >= Duration::from_millis(2 * 2000 + 3 * 100));
    }
}
