//! Job detail page parsing.
//!
//! Detail pages are free-form, so most fields are keyword heuristics over the
//! description text. Anything not found stays `None`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::models::JobDetails;

const MIN_DESCRIPTION_LEN: usize = 200;
const MIN_SUMMARY_PARAGRAPH_LEN: usize = 50;
const MAX_SUMMARY_LEN: usize = 300;

const BENEFIT_KEYWORDS: &[&str] = &[
    "health insurance",
    "401k",
    "pto",
    "paid time off",
    "dental",
    "vision",
    "retirement",
    "bonus",
];

static PAY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\$[\d,]+\s*-\s*\$[\d,]+\s*(?:per|/)\s*(?:year|hour|yr|hr)",
        r"(?i)\$[\d,]+k?\s*-\s*\$[\d,]+k?",
        r"(?i)salary:?\s*\$[\d,]+\s*-\s*\$[\d,]+",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Parse a rendered detail page
pub fn parse_job_details(html: &str) -> JobDetails {
    let document = Html::parse_document(html);
    let mut details = JobDetails::default();

    details.description = find_description(&document);

    if let Some(description) = &details.description {
        let text = description.to_lowercase();
        details.employment_type = employment_type(&text);
        details.remote_status = remote_status(&text);
        details.pay_range = pay_range(&text);
        details.benefits = benefits(&text);
    }

    details.summary = first_text(&document, &["p.job-summary", "div.summary"])
        .or_else(|| details.description.as_deref().and_then(summary_from_description));

    details.posted_date = posted_date(&document);

    details
}

fn find_description(document: &Html) -> Option<String> {
    for selector in ["div.job-description", "div#job-description"] {
        if let Some(el) = select_first(document, selector) {
            return Some(lines_text(el)).filter(|t| !t.is_empty());
        }
    }

    let divs = Selector::parse("div").ok()?;
    document
        .select(&divs)
        .find(|div| div.text().map(str::trim).collect::<String>().chars().count() > MIN_DESCRIPTION_LEN)
        .map(lines_text)
}

fn employment_type(text: &str) -> Option<String> {
    let kind = if text.contains("full-time") || text.contains("full time") {
        "Full-time"
    } else if text.contains("part-time") || text.contains("part time") {
        "Part-time"
    } else if text.contains("contract") {
        "Contract"
    } else {
        return None;
    };
    Some(kind.to_string())
}

fn remote_status(text: &str) -> Option<String> {
    let status = if text.contains("remote") && !text.contains("not remote") {
        if text.contains("hybrid") { "Hybrid" } else { "Remote" }
    } else if ["on-site", "onsite", "in-office"].iter().any(|k| text.contains(k)) {
        "On-site"
    } else {
        return None;
    };
    Some(status.to_string())
}

fn pay_range(text: &str) -> Option<String> {
    PAY_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|m| m.as_str().to_string())
}

fn benefits(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for keyword in BENEFIT_KEYWORDS {
        let label = title_case(keyword);
        if text.contains(keyword) && !found.contains(&label) {
            found.push(label);
        }
    }
    found
}

fn summary_from_description(description: &str) -> Option<String> {
    let paragraph = description
        .lines()
        .find(|line| line.chars().count() > MIN_SUMMARY_PARAGRAPH_LEN)?;

    if paragraph.chars().count() > MAX_SUMMARY_LEN {
        let cut: String = paragraph.chars().take(MAX_SUMMARY_LEN).collect();
        Some(format!("{cut}..."))
    } else {
        Some(paragraph.to_string())
    }
}

fn posted_date(document: &Html) -> Option<String> {
    let scripts = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    document.select(&scripts).find_map(|script| {
        let value: Value = serde_json::from_str(script.inner_html().trim()).ok()?;
        let candidates = match &value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => other
                .get("@graph")
                .and_then(Value::as_array)
                .map_or_else(|| vec![other], |graph| graph.iter().collect()),
        };
        candidates
            .into_iter()
            .find_map(|item| item.get("datePosted").and_then(Value::as_str))
            .map(str::to_string)
    })
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        let el = select_first(document, selector)?;
        let text = el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ");
        (!text.is_empty()).then_some(text)
    })
}

/// Text nodes trimmed and joined by newlines
fn lines_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if prev_alpha {
            out.push(c);
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"
        <html><head>
        <script type="application/ld+json">
        {"@context": "https://schema.org", "@type": "JobPosting", "datePosted": "2024-03-01"}
        </script>
        </head><body>
        <div class="job-description">
          <p>We are hiring a full-time graphic designer to join our hybrid team in Phoenix.</p>
          <p>Pay: $55,000 - $70,000 per year, plus bonus.</p>
          <p>Benefits include health insurance, dental, vision and a 401k match.</p>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_detail_page() {
        let details = parse_job_details(DETAIL_PAGE);

        assert_eq!(details.employment_type.as_deref(), Some("Full-time"));
        assert_eq!(details.remote_status, None);
        assert_eq!(details.pay_range.as_deref(), Some("$55,000 - $70,000 per year"));
        assert_eq!(
            details.benefits,
            ["Health Insurance", "401K", "Dental", "Vision", "Bonus"]
        );
        assert_eq!(details.posted_date.as_deref(), Some("2024-03-01"));
        assert_eq!(
            details.summary.as_deref(),
            Some("We are hiring a full-time graphic designer to join our hybrid team in Phoenix.")
        );
        assert!(details.description.unwrap().lines().count() == 3);
    }

    #[test]
    fn test_remote_and_hybrid() {
        assert_eq!(remote_status("fully remote role").as_deref(), Some("Remote"));
        assert_eq!(remote_status("remote or hybrid").as_deref(), Some("Hybrid"));
        assert_eq!(remote_status("this is not remote, onsite only").as_deref(), Some("On-site"));
        assert_eq!(remote_status("office in town"), None);
    }

    #[test]
    fn test_explicit_summary_wins() {
        let html = r#"<p class="job-summary"> Short  pitch </p>
                      <div id="job-description">Contract role</div>"#;
        let details = parse_job_details(html);
        assert_eq!(details.summary.as_deref(), Some("Short pitch"));
        assert_eq!(details.employment_type.as_deref(), Some("Contract"));
    }

    #[test]
    fn test_long_summary_is_truncated() {
        let long = "x".repeat(400);
        let summary = summary_from_description(&format!("short\n{long}")).unwrap();
        assert_eq!(summary.chars().count(), MAX_SUMMARY_LEN + 3);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_fallback_to_long_div() {
        let body = "Responsibilities include design work. ".repeat(10);
        let html = format!("<div><span>{body}</span></div>");
        let details = parse_job_details(&html);
        assert!(details.description.is_some());
    }

    #[test]
    fn test_empty_page_has_no_details() {
        assert_eq!(parse_job_details("<html></html>"), JobDetails::default());
    }

    #[test]
    fn test_graph_json_ld() {
        let html = r#"<script type="application/ld+json">
            {"@graph": [{"@type": "Organization"}, {"@type": "JobPosting", "datePosted": "2024-05-05"}]}
            </script>"#;
        assert_eq!(parse_job_details(html).posted_date.as_deref(), Some("2024-05-05"));
    }
}
