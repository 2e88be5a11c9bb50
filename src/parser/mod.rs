//! Listing card parser.
//!
//! Each field is read by an ordered list of named strategies compiled from the
//! site's [`SiteSelectors`]. The first strategy that yields a non-empty value
//! wins, so markup variants between pages degrade to a fallback instead of a
//! failed card. A card without a title is not a listing.

use scraper::{ElementRef, Selector};
use tracing::debug;
use url::Url;

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::Listing;
use crate::traits::{ListingParser, Lookup, ScraperConfig, Strategy};

enum CompiledLookup {
    Text(Selector),
    Attr(Selector, String),
    OwnAttr(String),
    TextWithout(Selector, Selector),
}

struct FieldStrategy {
    name: &'static str,
    lookup: CompiledLookup,
}

impl FieldStrategy {
    fn extract(&self, card: ElementRef<'_>) -> Option<String> {
        let value = match &self.lookup {
            CompiledLookup::Text(selector) => card.select(selector).next().map(collapsed_text),
            CompiledLookup::Attr(selector, attr) => card
                .select(selector)
                .find_map(|el| el.value().attr(attr))
                .map(|v| v.trim().to_string()),
            CompiledLookup::OwnAttr(attr) => card.value().attr(attr).map(|v| v.trim().to_string()),
            CompiledLookup::TextWithout(selector, minus) => {
                card.select(selector).next().map(|el| {
                    let full = collapsed_text(el);
                    match el.select(minus).next().map(collapsed_text) {
                        Some(removed) if !removed.is_empty() => {
                            strip_separators(&full.replacen(&removed, "", 1))
                        }
                        _ => full,
                    }
                })
            }
        };

        value.filter(|v| !v.is_empty())
    }
}

/// Parses listing cards for one site
pub struct CardParser {
    card: Selector,
    base_url: Url,
    source_tag: String,
    title: Vec<FieldStrategy>,
    company: Vec<FieldStrategy>,
    location: Vec<FieldStrategy>,
    link: Vec<FieldStrategy>,
    job_id: Vec<FieldStrategy>,
}

impl CardParser {
    /// Compile the site's selectors
    ///
    /// # Errors
    /// * `ScrapeError::Selector` if any configured selector does not parse
    /// * `ScrapeError::Config` if the site's base URL is not absolute
    pub fn from_config(config: &ScraperConfig) -> ScrapeResult<Self> {
        let selectors = &config.selectors;
        let base_url = Url::parse(&config.base_url).map_err(|e| ScrapeError::Config {
            key: "base_url".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            card: parse_selector(&selectors.listing_card)?,
            base_url,
            source_tag: config.source_tag.clone(),
            title: compile(&selectors.title)?,
            company: compile(&selectors.company)?,
            location: compile(&selectors.location)?,
            link: compile(&selectors.link)?,
            job_id: compile(&selectors.job_id)?,
        })
    }

    fn resolve_url(&self, href: &str) -> String {
        self.base_url
            .join(href)
            .map(String::from)
            .unwrap_or_default()
    }
}

impl ListingParser for CardParser {
    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn parse(&self, card: ElementRef<'_>) -> Option<Listing> {
        let Some(title) = first_match(&self.title, card) else {
            debug!("Skipping card without a title");
            return None;
        };

        let url = first_match(&self.link, card)
            .map(|href| self.resolve_url(&href))
            .unwrap_or_default();

        let job_id = first_match(&self.job_id, card)
            .or_else(|| id_from_url(&url))
            .unwrap_or_default();

        Some(Listing {
            job_id,
            title,
            company: first_match(&self.company, card).unwrap_or_default(),
            location: first_match(&self.location, card).unwrap_or_default(),
            url,
            source: self.source_tag.clone(),
        })
    }
}

fn first_match(strategies: &[FieldStrategy], card: ElementRef<'_>) -> Option<String> {
    strategies.iter().find_map(|strategy| {
        let value = strategy.extract(card)?;
        debug!(strategy = strategy.name, "Field resolved");
        Some(value)
    })
}

/// Listing ids sit in the second-to-last path segment, e.g. `/jobs/acme/ABC123/job/`
fn id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return None;
    }
    Some(segments[segments.len() - 2].to_string())
}

fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_separators(text: &str) -> String {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '|' | ',' | '·' | '•'))
        .to_string()
}

fn parse_selector(selector: &str) -> ScrapeResult<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

fn compile(strategies: &[Strategy]) -> ScrapeResult<Vec<FieldStrategy>> {
    strategies
        .iter()
        .map(|strategy| {
            let lookup = match &strategy.lookup {
                Lookup::Text(selector) => CompiledLookup::Text(parse_selector(selector)?),
                Lookup::Attr { selector, attr } => {
                    CompiledLookup::Attr(parse_selector(selector)?, attr.clone())
                }
                Lookup::OwnAttr(attr) => CompiledLookup::OwnAttr(attr.clone()),
                Lookup::TextWithout { selector, minus } => {
                    CompiledLookup::TextWithout(parse_selector(selector)?, parse_selector(minus)?)
                }
            };
            Ok(FieldStrategy {
                name: strategy.name,
                lookup,
            })
        })
        .collect()
}
