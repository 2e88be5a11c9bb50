//! Traits and interfaces for site-agnostic job scraping

use anyhow::Result;
use async_trait::async_trait;
use scraper::ElementRef;

use crate::error::ScrapeResult;
use crate::models::Listing;
use crate::query::SearchQuery;

/// Configuration for a job board
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Display name for the website
    pub name: String,
    /// Origin that relative listing links are resolved against
    pub base_url: String,
    /// Search endpoint; query parameters are appended to it
    pub search_url: String,
    /// Value written to every listing's `source` field
    pub source_tag: String,
    /// Where each listing field is found inside a card
    pub selectors: SiteSelectors,
    /// CSS locator of the "load more" button
    pub load_more_control: String,
}

/// One way of reading a value out of a listing card
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Collapsed text of the first descendant matching the selector
    Text(String),
    /// Attribute of the first descendant matching the selector
    Attr { selector: String, attr: String },
    /// Attribute of the card element itself
    OwnAttr(String),
    /// Text of `selector` with the text of its `minus` descendant removed
    TextWithout { selector: String, minus: String },
}

/// A named lookup; a field tries its strategies in order
#[derive(Debug, Clone)]
pub struct Strategy {
    pub name: &'static str,
    pub lookup: Lookup,
}

impl Strategy {
    pub fn new(name: &'static str, lookup: Lookup) -> Self {
        Self { name, lookup }
    }
}

/// Where the parts of a listing card live
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Selector matching one element per listing card
    pub listing_card: String,
    pub title: Vec<Strategy>,
    pub company: Vec<Strategy>,
    pub location: Vec<Strategy>,
    pub link: Vec<Strategy>,
    /// Explicit id lookups; the link's path is the last resort
    pub job_id: Vec<Strategy>,
}

/// A job board the finder knows how to search
pub trait JobSite: Send + Sync {
    /// Get the configuration for this site
    fn config(&self) -> &ScraperConfig;

    /// Build the search results URL for a query
    ///
    /// # Errors
    /// * `ScrapeError::InvalidQuery` when both role and city are blank
    fn build_search_url(&self, query: &SearchQuery) -> ScrapeResult<String> {
        query.validate()?;

        let mut url = format!(
            "{}?q={}&location={}",
            self.config().search_url,
            urlencoding::encode(query.role.trim()),
            urlencoding::encode(query.city.trim())
        );
        if let Some(radius) = query.radius_miles {
            url.push_str(&format!("&r={radius}"));
        }

        Ok(url)
    }
}

/// An interactive element found on the current page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub locator: String,
    pub enabled: bool,
}

/// A live browser tab driven by the scraper.
///
/// A session is owned by exactly one scrape at a time. Implementations do not
/// need to be shareable across tasks.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` and wait for the page to resolve
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// The current, script-rendered HTML of the page
    async fn current_content(&mut self) -> Result<String>;

    /// Look up an interactive element; `None` when it is not on the page
    async fn find_control(&mut self, locator: &str) -> Result<Option<Control>>;

    /// Activate a control previously returned by `find_control`
    async fn invoke(&mut self, control: &Control) -> Result<()>;

    /// Tear down the tab and its browser
    async fn close(&mut self) -> Result<()>;
}

/// Turns one listing card into a listing.
///
/// Implementations never fail: a card that cannot be read is `None`.
pub trait ListingParser: Send + Sync {
    /// Selector matching one element per listing card
    fn card_selector(&self) -> &scraper::Selector;

    /// Parse a card element from an already-parsed page
    fn parse(&self, card: ElementRef<'_>) -> Option<Listing>;

    /// Parse a standalone card fragment
    fn parse_html(&self, fragment: &str) -> Option<Listing> {
        let html = scraper::Html::parse_fragment(fragment);
        let card = html.select(self.card_selector()).next()?;
        self.parse(card)
    }
}
