//! USNLX (usnlx.com) site definition

use crate::traits::{JobSite, Lookup, ScraperConfig, SiteSelectors, Strategy};

pub const SOURCE_TAG: &str = "usnlx";

/// Site definition for USNLX job search
#[derive(Debug, Clone)]
pub struct UsnlxSite {
    config: ScraperConfig,
}

impl UsnlxSite {
    /// Create the USNLX site with its default markup selectors
    pub fn new() -> Self {
        let config = ScraperConfig {
            name: "USNLX".to_string(),
            base_url: "https://usnlx.com".to_string(),
            search_url: "https://usnlx.com/jobs/".to_string(),
            source_tag: SOURCE_TAG.to_string(),
            selectors: SiteSelectors {
                listing_card: "a.flex.px-2.py-4".to_string(),
                title: vec![
                    Strategy::new("heading", Lookup::Text("h2".to_string())),
                    Strategy::new("subheading", Lookup::Text("h3".to_string())),
                    Strategy::new("aria-label", Lookup::OwnAttr("aria-label".to_string())),
                ],
                company: vec![
                    Strategy::new("info-span", Lookup::Text("p span".to_string())),
                    Strategy::new("company-class", Lookup::Text(".company".to_string())),
                ],
                location: vec![
                    Strategy::new(
                        "info-remainder",
                        Lookup::TextWithout {
                            selector: "p".to_string(),
                            minus: "span".to_string(),
                        },
                    ),
                    Strategy::new("location-class", Lookup::Text(".location".to_string())),
                ],
                link: vec![
                    Strategy::new("card-href", Lookup::OwnAttr("href".to_string())),
                    Strategy::new(
                        "nested-link",
                        Lookup::Attr {
                            selector: "a[href]".to_string(),
                            attr: "href".to_string(),
                        },
                    ),
                ],
                job_id: vec![Strategy::new(
                    "data-attribute",
                    Lookup::OwnAttr("data-job-id".to_string()),
                )],
            },
            load_more_control: r#"button[aria-label="Load more jobs"]"#.to_string(),
        };

        Self { config }
    }
}

impl Default for UsnlxSite {
    fn default() -> Self {
        Self::new()
    }
}

impl JobSite for UsnlxSite {
    fn config(&self) -> &ScraperConfig {
        &self.config
    }
}
