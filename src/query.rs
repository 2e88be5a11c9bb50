//! Search parameters and title keyword filtering

use serde::{Deserialize, Serialize};

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::Listing;

/// What to search for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub role: String,
    pub city: String,
    pub radius_miles: Option<u32>,
    /// Keep only titles containing at least one of these
    #[serde(default)]
    pub include_keywords: Vec<String>,
    /// Drop titles containing any of these
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

impl SearchQuery {
    pub fn new(role: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            city: city.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_radius(mut self, miles: u32) -> Self {
        self.radius_miles = Some(miles);
        self
    }

    #[must_use]
    pub fn including<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn excluding<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn validate(&self) -> ScrapeResult<()> {
        if self.role.trim().is_empty() && self.city.trim().is_empty() {
            return Err(ScrapeError::InvalidQuery {
                reason: "role and city are both empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn has_keyword_filter(&self) -> bool {
        !self.include_keywords.is_empty() || !self.exclude_keywords.is_empty()
    }

    /// Whether a title passes the include/exclude keywords
    pub fn matches_title(&self, title: &str) -> bool {
        let title_lower = title.to_lowercase();
        let contains = |keyword: &String| title_lower.contains(&keyword.to_lowercase());

        if self.exclude_keywords.iter().any(contains) {
            return false;
        }

        self.include_keywords.is_empty() || self.include_keywords.iter().any(contains)
    }

    /// Apply the keyword filter, keeping order
    pub fn filter(&self, listings: Vec<Listing>) -> Vec<Listing> {
        if !self.has_keyword_filter() {
            return listings;
        }
        listings
            .into_iter()
            .filter(|listing| self.matches_title(&listing.title))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str) -> Listing {
        Listing {
            job_id: title.to_string(),
            title: title.to_string(),
            company: String::new(),
            location: String::new(),
            url: String::new(),
            source: "usnlx".to_string(),
        }
    }

    #[test]
    fn test_validate_requires_role_or_city() {
        assert!(SearchQuery::new("", "  ").validate().is_err());
        assert!(SearchQuery::new("Nurse", "").validate().is_ok());
        assert!(SearchQuery::new("", "Chicago").validate().is_ok());
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let query = SearchQuery::new("Designer", "Phoenix, AZ")
            .including(["graphic", "web"])
            .excluding(["cad"]);

        assert!(query.matches_title("Senior Web Designer"));
        assert!(!query.matches_title("CAD Graphic Designer"));
        assert!(!query.matches_title("Interior Designer"));
    }

    #[test]
    fn test_filter_keeps_order() {
        let query = SearchQuery::new("Designer", "Phoenix").including(["ux", "ui"]);
        let kept = query.filter(vec![
            listing("UX Designer"),
            listing("Mechanical Designer"),
            listing("UI Engineer"),
        ]);
        let titles: Vec<_> = kept.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["UX Designer", "UI Engineer"]);
    }

    #[test]
    fn test_no_keywords_keeps_everything() {
        let query = SearchQuery::new("Nurse", "Chicago");
        assert_eq!(query.filter(vec![listing("a"), listing("b")]).len(), 2);
    }
}
