//! Data models for scraped job listings and scrape summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::load_more::LoadMoreState;

/// A job listing scraped from a search results page.
///
/// Every field is always present; a value the card did not carry is an empty
/// string. `job_id` is the dedup key, and an empty one never matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub source: String,
}

impl Listing {
    /// The dedup key, or `None` when the card had no usable id
    pub fn dedup_key(&self) -> Option<&str> {
        let id = self.job_id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// Extra fields read from a listing's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetails {
    pub summary: Option<String>,
    pub pay_range: Option<String>,
    pub employment_type: Option<String>,
    pub remote_status: Option<String>,
    pub benefits: Vec<String>,
    pub description: Option<String>,
    pub posted_date: Option<String>,
}

/// A listing merged with its detail page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedListing {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(flatten)]
    pub details: JobDetails,
    pub scraped_at: DateTime<Utc>,
}

/// Everything one scrape produced, including how the load-more loop ended
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub listings: Vec<Listing>,
    pub terminal_state: LoadMoreState,
    pub load_more_invocations: usize,
    pub extraction_passes: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
