//! Page-level extraction: every listing card on a rendered results page.

use scraper::Html;
use tracing::debug;

use crate::models::Listing;
use crate::traits::ListingParser;

/// Result of one extraction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Parsed listings in page order
    pub listings: Vec<Listing>,
    /// Cards located on the page, including ones that did not parse
    pub fragment_count: usize,
}

/// Runs a [`ListingParser`] over every card of a page
pub struct PageExtractor<P> {
    parser: P,
}

impl<P: ListingParser> PageExtractor<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Extract all listings from the page HTML.
    ///
    /// The parsed document is not `Send`, so it never outlives this call.
    pub fn extract(&self, page_content: &str) -> Extraction {
        let document = Html::parse_document(page_content);

        let mut extraction = Extraction::default();
        for card in document.select(self.parser.card_selector()) {
            extraction.fragment_count += 1;
            if let Some(listing) = self.parser.parse(card) {
                extraction.listings.push(listing);
            }
        }

        let skipped = extraction.fragment_count - extraction.listings.len();
        if skipped > 0 {
            debug!("Skipped {} of {} cards that did not parse", skipped, extraction.fragment_count);
        }

        extraction
    }
}
