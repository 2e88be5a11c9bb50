//! Scrape options, loaded from the environment with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ScrapeError, ScrapeResult};

/// Browser family used to drive the search page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    #[default]
    Chrome,
    Firefox,
}

impl fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chrome => write!(f, "chrome"),
            Self::Firefox => write!(f, "firefox"),
        }
    }
}

impl FromStr for BrowserEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            other => Err(format!("unknown browser engine {other:?}")),
        }
    }
}

/// Knobs for one scrape invocation.
///
/// Every wait the scraper performs is bounded by one of these durations, so a
/// scrape always returns control to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub browser_engine: BrowserEngine,
    pub headless: bool,
    /// Upper bound on "load more" clicks per scrape
    pub max_load_more_attempts: usize,
    /// How long the initial navigation may take
    pub page_wait_timeout: Duration,
    /// How long to wait for new cards after one "load more" click
    pub load_more_timeout: Duration,
    /// Delay between two content polls while waiting for new cards
    pub poll_interval: Duration,
    /// Minimum gap between two consecutive "load more" clicks
    pub pacing_delay: Duration,
    /// Chromium binary to launch instead of the auto-detected one
    pub chrome_path: Option<PathBuf>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            browser_engine: BrowserEngine::Chrome,
            headless: true,
            max_load_more_attempts: 50,
            page_wait_timeout: Duration::from_secs(10),
            load_more_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            pacing_delay: Duration::from_millis(500),
            chrome_path: None,
        }
    }
}

impl ScrapeOptions {
    /// Builds options from `JOB_FINDER_*` environment variables.
    ///
    /// Unset variables keep their default; set but unparsable ones are an error.
    pub fn from_env() -> ScrapeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ScrapeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            browser_engine: parse_var(&lookup, "JOB_FINDER_BROWSER")?
                .unwrap_or(defaults.browser_engine),
            headless: parse_var(&lookup, "JOB_FINDER_HEADLESS")?.unwrap_or(defaults.headless),
            max_load_more_attempts: parse_var(&lookup, "JOB_FINDER_MAX_LOAD_MORE")?
                .unwrap_or(defaults.max_load_more_attempts),
            page_wait_timeout: parse_var(&lookup, "JOB_FINDER_PAGE_TIMEOUT_SECS")?
                .map_or(defaults.page_wait_timeout, Duration::from_secs),
            load_more_timeout: parse_var(&lookup, "JOB_FINDER_LOAD_MORE_TIMEOUT_SECS")?
                .map_or(defaults.load_more_timeout, Duration::from_secs),
            poll_interval: parse_var(&lookup, "JOB_FINDER_POLL_INTERVAL_MS")?
                .map_or(defaults.poll_interval, Duration::from_millis),
            pacing_delay: parse_var(&lookup, "JOB_FINDER_PACING_MS")?
                .map_or(defaults.pacing_delay, Duration::from_millis),
            chrome_path: existing_path(&lookup, "JOB_FINDER_CHROME_PATH")?,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> ScrapeResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ScrapeError::Config {
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

fn existing_path<F>(lookup: &F, key: &str) -> ScrapeResult<Option<PathBuf>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(path) = parse_var::<PathBuf, F>(lookup, key)? else {
        return Ok(None);
    };
    if !path.exists() {
        return Err(ScrapeError::Config {
            key: key.to_string(),
            reason: format!("{} does not exist", path.display()),
        });
    }
    Ok(Some(path))
}
