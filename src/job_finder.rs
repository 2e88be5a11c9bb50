use std::collections::HashSet;

use chrono::Utc;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::ScrapeOptions;
use crate::details::parse_job_details;
use crate::error::{ScrapeError, ScrapeResult};
use crate::extractor::{Extraction, PageExtractor};
use crate::load_more::LoadMoreDriver;
use crate::models::{DetailedListing, JobDetails, Listing, ScrapeReport};
use crate::parser::CardParser;
use crate::query::SearchQuery;
use crate::scrapers::UsnlxSite;
use crate::traits::{BrowserSession, JobSite};

/// Ordered, deduplicated listings accumulated across extraction passes.
///
/// The first listing seen for a `job_id` wins; later copies are dropped even
/// if their fields differ. Listings without an id are always kept.
#[derive(Debug, Default)]
pub struct ListingCollector {
    seen: HashSet<String>,
    listings: Vec<Listing>,
}

impl ListingCollector {
    /// Append unseen listings, returning how many were new
    pub fn merge(&mut self, listings: Vec<Listing>) -> usize {
        let before = self.listings.len();
        for listing in listings {
            if let Some(key) = listing.dedup_key()
                && !self.seen.insert(key.to_string())
            {
                continue;
            }
            self.listings.push(listing);
        }
        self.listings.len() - before
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn into_listings(self) -> Vec<Listing> {
        self.listings
    }
}

/// Runs searches against one job site.
///
/// The finder itself holds no browser; every call takes ownership of a fresh
/// session and closes it before returning, on success and on failure.
pub struct JobFinder<W = UsnlxSite> {
    site: W,
    extractor: PageExtractor<CardParser>,
    options: ScrapeOptions,
}

impl JobFinder<UsnlxSite> {
    pub fn usnlx(options: ScrapeOptions) -> ScrapeResult<Self> {
        Self::new(UsnlxSite::new(), options)
    }
}

impl<W: JobSite> JobFinder<W> {
    pub fn new(site: W, options: ScrapeOptions) -> ScrapeResult<Self> {
        let parser = CardParser::from_config(site.config())?;

        Ok(Self {
            site,
            extractor: PageExtractor::new(parser),
            options,
        })
    }

    /// Search and return every listing, in first-seen order
    pub async fn scrape<S: BrowserSession>(
        &self,
        session: S,
        query: &SearchQuery,
    ) -> ScrapeResult<Vec<Listing>> {
        Ok(self.scrape_with_report(session, query).await?.listings)
    }

    /// Search and report how the load-more loop ended
    pub async fn scrape_with_report<S: BrowserSession>(
        &self,
        mut session: S,
        query: &SearchQuery,
    ) -> ScrapeResult<ScrapeReport> {
        let outcome = self.collect(&mut session, query).await;
        release(&mut session).await;
        outcome
    }

    /// Search, then visit each listing's page for its details
    pub async fn scrape_detailed<S: BrowserSession>(
        &self,
        mut session: S,
        query: &SearchQuery,
    ) -> ScrapeResult<Vec<DetailedListing>> {
        let outcome = match self.collect(&mut session, query).await {
            Ok(report) => Ok(self.fetch_details(&mut session, report.listings).await),
            Err(e) => Err(e),
        };
        release(&mut session).await;
        outcome
    }

    async fn collect<S: BrowserSession>(
        &self,
        session: &mut S,
        query: &SearchQuery,
    ) -> ScrapeResult<ScrapeReport> {
        let started_at = Utc::now();
        let config = self.site.config();
        let search_url = self.site.build_search_url(query)?;

        info!(
            "Searching {} for '{}' in '{}'",
            config.name, query.role, query.city
        );
        self.navigate(session, &search_url).await?;

        let seed = self
            .wait_for_first_render(session, &config.load_more_control)
            .await?;
        info!("Initial page has {} listing cards", seed.fragment_count);

        let mut collected = ListingCollector::default();
        collected.merge(seed.listings);
        let mut extraction_passes = 1;

        let mut driver = LoadMoreDriver::new(
            session,
            &self.extractor,
            &config.load_more_control,
            &self.options,
            seed.fragment_count,
        );
        while let Some(extraction) = driver.advance().await? {
            extraction_passes += 1;
            let added = collected.merge(extraction.listings);
            debug!("Pass {} added {} new listings", extraction_passes, added);
        }

        let terminal_state = driver.state();
        let load_more_invocations = driver.invocations();
        let found = collected.len();

        let mut listings = collected.into_listings();
        if query.has_keyword_filter() {
            listings = query.filter(listings);
            info!("Filtered to {} of {} listings by keyword", listings.len(), found);
        }

        info!(
            "Found {} unique listings on {} ({} load-more clicks, ended {:?})",
            listings.len(),
            config.name,
            load_more_invocations,
            terminal_state
        );

        Ok(ScrapeReport {
            listings,
            terminal_state,
            load_more_invocations,
            extraction_passes,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn navigate<S: BrowserSession>(&self, session: &mut S, url: &str) -> ScrapeResult<()> {
        match timeout(self.options.page_wait_timeout, session.navigate(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: format!("{e:#}"),
            }),
            Err(_) => Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {:?}", self.options.page_wait_timeout),
            }),
        }
    }

    /// Poll until a card or the load-more control shows up.
    ///
    /// Gives up after `page_wait_timeout` and returns whatever the page holds,
    /// which for a search without results is nothing.
    async fn wait_for_first_render<S: BrowserSession>(
        &self,
        session: &mut S,
        control_locator: &str,
    ) -> ScrapeResult<Extraction> {
        let deadline = Instant::now() + self.options.page_wait_timeout;
        loop {
            let content = session.current_content().await?;
            let extraction = self.extractor.extract(&content);
            if extraction.fragment_count > 0 {
                return Ok(extraction);
            }
            if session.find_control(control_locator).await?.is_some() {
                debug!("Load-more control rendered before any listing card");
                return Ok(extraction);
            }
            if Instant::now() >= deadline {
                debug!(
                    "No listing card rendered within {:?}",
                    self.options.page_wait_timeout
                );
                return Ok(extraction);
            }
            sleep(self.options.poll_interval).await;
        }
    }

    /// Detail pages are visited one at a time on the scrape's own session
    async fn fetch_details<S: BrowserSession>(
        &self,
        session: &mut S,
        listings: Vec<Listing>,
    ) -> Vec<DetailedListing> {
        let total = listings.len();
        let scraped_at = Utc::now();
        let mut detailed = Vec::with_capacity(total);

        info!("Extracting details for {} listings", total);
        for (index, listing) in listings.into_iter().enumerate() {
            debug!("[{}/{}] {}", index + 1, total, listing.title);

            let details = match self.fetch_detail_page(session, &listing.url).await {
                Ok(html) => parse_job_details(&html),
                Err(e) => {
                    warn!("Failed to fetch details for {}: {}", listing.title, e);
                    JobDetails::default()
                }
            };

            detailed.push(DetailedListing {
                listing,
                details,
                scraped_at,
            });
        }

        detailed
    }

    async fn fetch_detail_page<S: BrowserSession>(
        &self,
        session: &mut S,
        url: &str,
    ) -> ScrapeResult<String> {
        if url.is_empty() {
            return Err(ScrapeError::Navigation {
                url: String::new(),
                reason: "listing has no link".to_string(),
            });
        }
        self.navigate(session, url).await?;
        Ok(session.current_content().await?)
    }
}

async fn release<S: BrowserSession>(session: &mut S) {
    if let Err(e) = session.close().await {
        warn!("Failed to close browser session: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(job_id: &str, location: &str) -> Listing {
        Listing {
            job_id: job_id.to_string(),
            title: format!("Job {job_id}"),
            company: "Acme".to_string(),
            location: location.to_string(),
            url: String::new(),
            source: "usnlx".to_string(),
        }
    }

    #[test]
    fn test_first_seen_wins() {
        let mut collector = ListingCollector::default();
        assert_eq!(collector.merge(vec![listing("A", "Phoenix"), listing("B", "Tempe")]), 2);
        assert_eq!(collector.merge(vec![listing("A", "Mesa"), listing("C", "Tucson")]), 1);

        let listings = collector.into_listings();
        let ids: Vec<_> = listings.iter().map(|l| l.job_id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);
        assert_eq!(listings[0].location, "Phoenix");
    }

    #[test]
    fn test_listings_without_id_are_always_kept() {
        let mut collector = ListingCollector::default();
        collector.merge(vec![listing("", "x"), listing(" ", "y")]);
        collector.merge(vec![listing("", "x")]);
        assert_eq!(collector.len(), 3);
    }

    #[test]
    fn test_duplicates_within_one_pass() {
        let mut collector = ListingCollector::default();
        assert_eq!(collector.merge(vec![listing("A", "x"), listing("A", "y")]), 1);
        assert!(!collector.is_empty());
    }
}
