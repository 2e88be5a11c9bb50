//! Chromium session using chromiumoxide.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ScrapeOptions;
use crate::error::ScrapeResult;
use crate::traits::{BrowserSession, Control};

/// Reports a control's state as a string; a JS `null` carries no value over CDP
const CONTROL_STATE_SCRIPT: &str = "(() => { const el = document.querySelector(__LOCATOR__); \
     if (!el) return 'absent'; \
     return (el.disabled || el.getAttribute('aria-disabled') === 'true') ? 'disabled' : 'enabled'; })()";

/// Map the state reported by the lookup script
fn control_from_state(locator: &str, state: &str) -> Result<Option<Control>> {
    let enabled = match state {
        "absent" => return Ok(None),
        "enabled" => true,
        "disabled" => false,
        other => anyhow::bail!("unexpected control state {other:?} for {locator}"),
    };
    Ok(Some(Control {
        locator: locator.to_string(),
        enabled,
    }))
}

/// One Chromium process with a single tab
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    closed: bool,
}

impl ChromiumSession {
    /// Launch Chromium and open a blank tab
    pub async fn launch(options: &ScrapeOptions) -> ScrapeResult<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Chromium handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open tab")?;

        info!("Chromium session started (headless: {})", options.headless);
        Ok(Self {
            browser,
            page,
            handler_task,
            closed: false,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("failed to load {url}"))?;
        self.page
            .wait_for_navigation()
            .await
            .with_context(|| format!("{url} did not finish loading"))?;
        Ok(())
    }

    async fn current_content(&mut self) -> Result<String> {
        let html: String = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to read page HTML")?
            .into_value()
            .context("page HTML was not a string")?;
        Ok(html)
    }

    async fn find_control(&mut self, locator: &str) -> Result<Option<Control>> {
        let script = CONTROL_STATE_SCRIPT.replace("__LOCATOR__", &serde_json::to_string(locator)?);

        let state: String = self
            .page
            .evaluate(script)
            .await
            .with_context(|| format!("failed to look up {locator}"))?
            .into_value()
            .context("unexpected control lookup result")?;

        control_from_state(locator, &state)
    }

    async fn invoke(&mut self, control: &Control) -> Result<()> {
        let element = self
            .page
            .find_element(control.locator.as_str())
            .await
            .with_context(|| format!("control {} vanished", control.locator))?;
        element
            .scroll_into_view()
            .await
            .context("failed to scroll control into view")?;
        element
            .click()
            .await
            .with_context(|| format!("failed to click {}", control.locator))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.browser.close().await.context("failed to close Chromium");
        if let Err(e) = self.browser.wait().await {
            warn!("Chromium did not exit cleanly: {}", e);
        }
        self.handler_task.abort();
        info!("Chromium session closed");

        result.map(|_| ())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Chromium session dropped without close, aborting handler");
            self.handler_task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCATOR: &str = r#"button[aria-label="Load more jobs"]"#;

    #[test]
    fn test_absent_control_is_none() {
        assert_eq!(control_from_state(LOCATOR, "absent").unwrap(), None);
    }

    #[test]
    fn test_control_states() {
        let enabled = control_from_state(LOCATOR, "enabled").unwrap().unwrap();
        assert!(enabled.enabled);
        assert_eq!(enabled.locator, LOCATOR);

        let disabled = control_from_state(LOCATOR, "disabled").unwrap().unwrap();
        assert!(!disabled.enabled);
    }

    #[test]
    fn test_unknown_state_is_an_error() {
        assert!(control_from_state(LOCATOR, "null").is_err());
    }

    #[test]
    fn test_state_script_embeds_quoted_locator() {
        let script = CONTROL_STATE_SCRIPT.replace("__LOCATOR__", &serde_json::to_string(LOCATOR).unwrap());
        assert!(script.contains(r#"document.querySelector("button[aria-label=\"Load more jobs\"]")"#));
        assert!(script.contains("'absent'"));
        assert!(!script.contains("null"));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_reads_page_and_finds_controls() {
        let mut session = ChromiumSession::launch(&ScrapeOptions::default())
            .await
            .expect("failed to launch Chromium");

        session
            .navigate("data:text/html,<h2>Hello</h2><button aria-label=\"Load more jobs\">More</button>")
            .await
            .expect("navigation failed");

        let html = session.current_content().await.expect("content failed");
        assert!(html.contains("<h2>Hello</h2>"));

        let control = session
            .find_control(r#"button[aria-label="Load more jobs"]"#)
            .await
            .expect("lookup failed")
            .expect("control missing");
        assert!(control.enabled);
        session.invoke(&control).await.expect("click failed");

        assert!(session.find_control("#nope").await.expect("lookup failed").is_none());

        session.close().await.expect("close failed");
    }
}
