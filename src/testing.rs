//! Testing utilities: a scripted browser session and results page builders.
//!
//! `MockSession` plays back a sequence of page snapshots. Each "load more"
//! click queues the next snapshot, which becomes visible after a configurable
//! number of content reads, mimicking a page that renders asynchronously.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::traits::{BrowserSession, Control};

/// HTML of one USNLX-style listing card numbered `n`
pub fn listing_card(n: usize) -> String {
    format!(
        r#"<li><a class="flex px-2 py-4" href="/jobs/company-{n}-software-engineer/JOB{n:04}/job/"><h2>Software Engineer {n}</h2><p><span>Company {n}</span> San Francisco, CA</p></a></li>"#
    )
}

/// Cards numbered `first..=last`
pub fn listing_cards(first: usize, last: usize) -> Vec<String> {
    (first..=last).map(listing_card).collect()
}

/// A results page holding the given cards, followed by a "load more" button
pub fn results_page(cards: &[String]) -> String {
    format!(
        r#"<html><body><ul>{}</ul><button aria-label="Load more jobs">More</button></body></html>"#,
        cards.concat()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlMode {
    Present,
    Disabled,
    Absent,
}

#[derive(Debug, Clone)]
enum Script {
    /// Fixed snapshots; clicking past the last one loads nothing
    Pages(Vec<String>),
    /// Every click adds `per_click` cards, forever
    Growing { per_click: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Navigation {
    Succeeds,
    Fails,
    Hangs,
}

/// Counters shared between a `MockSession` and the test that built it
#[derive(Debug, Default)]
pub struct MockStats {
    invocations: AtomicUsize,
    content_reads: AtomicUsize,
    closed: AtomicBool,
    navigations: Mutex<Vec<String>>,
}

impl MockStats {
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn content_reads(&self) -> usize {
        self.content_reads.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

/// A scripted [`BrowserSession`]
#[derive(Debug)]
pub struct MockSession {
    script: Script,
    control: ControlMode,
    navigation: Navigation,
    render_delay: usize,
    /// Blank reads left before the search page first renders
    blank_reads: usize,
    rendered: bool,
    detail_pages: HashMap<String, String>,

    search_loaded: bool,
    detail_view: Option<String>,
    /// Snapshot index (`Pages`) or card count (`Growing`)
    shown: usize,
    /// Queued state and the reads left before it shows
    pending: Option<(usize, usize)>,
    stats: Arc<MockStats>,
}

impl MockSession {
    /// Play back `pages`; the first is shown after navigation
    pub fn with_pages(pages: Vec<String>) -> Self {
        Self::new(Script::Pages(pages), 0)
    }

    /// Start with `initial` cards and add `per_click` on every click
    pub fn growing(initial: usize, per_click: usize) -> Self {
        Self::new(Script::Growing { per_click }, initial)
    }

    /// Pages holding 1..=n cards for each cumulative count in `counts`
    pub fn with_card_counts(counts: &[usize]) -> Self {
        let pages = counts
            .iter()
            .map(|&n| results_page(&listing_cards(1, n)))
            .collect();
        Self::with_pages(pages)
    }

    fn new(script: Script, shown: usize) -> Self {
        Self {
            script,
            control: ControlMode::Present,
            navigation: Navigation::Succeeds,
            render_delay: 0,
            blank_reads: 0,
            rendered: true,
            detail_pages: HashMap::new(),
            search_loaded: false,
            detail_view: None,
            shown,
            pending: None,
            stats: Arc::new(MockStats::default()),
        }
    }

    #[must_use]
    pub fn without_control(mut self) -> Self {
        self.control = ControlMode::Absent;
        self
    }

    #[must_use]
    pub fn with_disabled_control(mut self) -> Self {
        self.control = ControlMode::Disabled;
        self
    }

    #[must_use]
    pub fn failing_navigation(mut self) -> Self {
        self.navigation = Navigation::Fails;
        self
    }

    /// Navigation never completes; only a timeout gets control back
    #[must_use]
    pub fn hanging_navigation(mut self) -> Self {
        self.navigation = Navigation::Hangs;
        self
    }

    /// New content becomes visible only after this many extra reads
    #[must_use]
    pub fn with_render_delay(mut self, reads: usize) -> Self {
        self.render_delay = reads;
        self
    }

    /// The search page reads as empty, without any control, for this many reads
    #[must_use]
    pub fn with_initial_render_delay(mut self, reads: usize) -> Self {
        self.blank_reads = reads;
        self.rendered = reads == 0;
        self
    }

    #[must_use]
    pub fn with_detail_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.detail_pages.insert(url.into(), html.into());
        self
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    fn render(&self) -> String {
        match &self.script {
            Script::Pages(pages) => pages.get(self.shown).cloned().unwrap_or_default(),
            Script::Growing { .. } => results_page(&listing_cards(1, self.shown)),
        }
    }

    fn next_state(&self) -> Option<usize> {
        match &self.script {
            Script::Pages(pages) => (self.shown + 1 < pages.len()).then_some(self.shown + 1),
            Script::Growing { per_click } => Some(self.shown + per_click),
        }
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if let Ok(mut urls) = self.stats.navigations.lock() {
            urls.push(url.to_string());
        }

        match self.navigation {
            Navigation::Fails => return Err(anyhow!("net::ERR_NAME_NOT_RESOLVED at {url}")),
            Navigation::Hangs => std::future::pending::<()>().await,
            Navigation::Succeeds => {}
        }

        if let Some(html) = self.detail_pages.get(url) {
            self.detail_view = Some(html.clone());
        } else if self.search_loaded {
            return Err(anyhow!("no page scripted for {url}"));
        } else {
            self.search_loaded = true;
            self.detail_view = None;
        }
        Ok(())
    }

    async fn current_content(&mut self) -> Result<String> {
        self.stats.content_reads.fetch_add(1, Ordering::SeqCst);

        if let Some(html) = &self.detail_view {
            return Ok(html.clone());
        }
        if !self.search_loaded {
            return Ok(String::from("<html><body></body></html>"));
        }
        if !self.rendered {
            if self.blank_reads > 0 {
                self.blank_reads -= 1;
                return Ok(String::from("<html><body><ul></ul></body></html>"));
            }
            self.rendered = true;
        }

        if let Some((state, reads_left)) = self.pending {
            if reads_left == 0 {
                self.shown = state;
                self.pending = None;
            } else {
                self.pending = Some((state, reads_left - 1));
            }
        }

        Ok(self.render())
    }

    async fn find_control(&mut self, locator: &str) -> Result<Option<Control>> {
        if !self.rendered {
            return Ok(None);
        }
        let control = match self.control {
            ControlMode::Absent => None,
            mode => Some(Control {
                locator: locator.to_string(),
                enabled: mode == ControlMode::Present,
            }),
        };
        Ok(control)
    }

    async fn invoke(&mut self, control: &Control) -> Result<()> {
        if !control.enabled {
            return Err(anyhow!("control {} is disabled", control.locator));
        }
        self.stats.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(state) = self.next_state() {
            self.pending = Some((state, self.render_delay));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.stats.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
