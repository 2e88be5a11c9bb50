//! Job listing scraper for script-rendered, "load more" paginated search pages.
//!
//! A [`JobFinder`] drives one [`BrowserSession`] per search: it navigates to
//! the results page, extracts listing cards, clicks "load more" until the page
//! stops growing or the click budget runs out, and returns the listings
//! deduplicated by `job_id` in first-seen order.
//!
//! ```no_run
//! use job_finder::{JobFinder, ScrapeOptions, SearchQuery, browser};
//!
//! # async fn run() -> Result<(), job_finder::ScrapeError> {
//! let options = ScrapeOptions::from_env()?;
//! let finder = JobFinder::usnlx(options.clone())?;
//! let session = browser::launch(&options).await?;
//! let listings = finder
//!     .scrape(session, &SearchQuery::new("Software Engineer", "San Francisco"))
//!     .await?;
//! println!("Found {} jobs", listings.len());
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod details;
pub mod error;
pub mod extractor;
pub mod job_finder;
pub mod load_more;
pub mod models;
pub mod parser;
pub mod query;
pub mod scrapers;
pub mod testing;
pub mod traits;

pub use config::{BrowserEngine, ScrapeOptions};
pub use error::{ScrapeError, ScrapeResult};
pub use extractor::{Extraction, PageExtractor};
pub use job_finder::{JobFinder, ListingCollector};
pub use load_more::{LoadMoreDriver, LoadMoreState};
pub use models::{DetailedListing, JobDetails, Listing, ScrapeReport};
pub use parser::CardParser;
pub use query::SearchQuery;
pub use traits::{BrowserSession, Control, JobSite, ListingParser};
