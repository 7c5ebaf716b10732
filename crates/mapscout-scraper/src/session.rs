//! The real [`MapPage`]: one Chromium tab driven over CDP.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use mapscout_core::AppConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::BrowserError;
use crate::page::MapPage;
use crate::pacing::Pacing;
use crate::user_agent;

const MIN_WIDTH: u32 = 1200;
const MAX_WIDTH: u32 = 1920;
const MIN_HEIGHT: u32 = 800;
const MAX_HEIGHT: u32 = 1080;

const WAIT_POLL: Duration = Duration::from_millis(250);

/// Hides the most common automation tell before any page script runs.
const HIDE_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// CDP messages that mean a node handle no longer points into the document.
const STALE_MARKERS: [&str; 3] = [
    "No node with given id",
    "Could not find node",
    "Node is detached",
];

/// Launch parameters for [`ChromiumSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    pub window: (u32, u32),
}

impl SessionOptions {
    /// Options from config with a user agent and window size drawn via `pacing`.
    #[must_use]
    pub fn from_config(config: &AppConfig, pacing: &dyn Pacing) -> Self {
        let width = MIN_WIDTH + span(pacing, MAX_WIDTH - MIN_WIDTH);
        let height = MIN_HEIGHT + span(pacing, MAX_HEIGHT - MIN_HEIGHT);
        Self {
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
            user_agent: user_agent::pick(pacing).to_string(),
            window: (width, height),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let (width, height) = self.window;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", self.user_agent))
            .arg(format!("--window-size={width},{height}"));
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(BrowserError::Launch)
    }
}

fn span(pacing: &dyn Pacing, width: u32) -> u32 {
    let offset = pacing.pick_index(width as usize + 1);
    u32::try_from(offset).unwrap_or(0).min(width)
}

/// A launched browser with a single working tab.
///
/// The CDP handler runs on its own task; when its event stream ends the
/// browser is gone and the session reports itself closed.
pub struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: JoinHandle<()>,
    closed: Arc<AtomicBool>,
}

impl ChromiumSession {
    /// Launches the browser and opens a blank tab.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Launch`] if Chromium cannot be found or started,
    /// or the first tab cannot be opened.
    pub async fn launch(options: &SessionOptions) -> Result<Self, BrowserError> {
        let config = options.browser_config()?;
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let closed = Arc::new(AtomicBool::new(false));
        let handler_task = spawn_handler_task(handler, Arc::clone(&closed));

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler_task.abort();
                return Err(BrowserError::Launch(err.to_string()));
            }
        };
        if let Err(err) = page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(HIDE_WEBDRIVER))
            .await
        {
            tracing::warn!(error = %err, "could not install webdriver mask");
        }

        tracing::info!(
            headless = options.headless,
            width = options.window.0,
            height = options.window.1,
            "browser session started"
        );
        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
            closed,
        })
    }

    fn classify(&self, action: &'static str, err: &CdpError) -> BrowserError {
        if self.is_closed() {
            return BrowserError::SessionClosed;
        }
        let reason = err.to_string();
        if STALE_MARKERS.iter().any(|m| reason.contains(m)) {
            BrowserError::StaleElement
        } else {
            BrowserError::Interaction { action, reason }
        }
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.is_closed() {
            Err(BrowserError::SessionClosed)
        } else {
            Ok(())
        }
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, js: String) -> Result<T, BrowserError> {
        self.ensure_open()?;
        let value = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| self.classify("evaluate", &e))?;
        value
            .into_value::<T>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }
}

fn spawn_handler_task(mut handler: Handler, closed: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(err) = event {
                tracing::debug!(error = %err, "browser handler event error");
            }
        }
        closed.store(true, Ordering::SeqCst);
        tracing::debug!("browser handler finished");
    })
}

/// JSON string literal for embedding a selector in a script.
fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

impl MapPage for ChromiumSession {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.page.goto(url).await.map_err(|e| {
            if self.is_closed() {
                BrowserError::SessionClosed
            } else {
                BrowserError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        self.ensure_open()?;
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements),
            Err(err) => match self.classify("find elements", &err) {
                // A selector with no match surfaces as a CDP error here.
                BrowserError::Interaction { .. } => Ok(Vec::new()),
                other => Err(other),
            },
        }
    }

    async fn text_of(&self, element: &Element) -> Result<Option<String>, BrowserError> {
        element
            .inner_text()
            .await
            .map_err(|e| self.classify("read text", &e))
    }

    async fn attribute_of(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        element
            .attribute(name)
            .await
            .map_err(|e| self.classify("read attribute", &e))
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), BrowserError> {
        element
            .scroll_into_view()
            .await
            .map(|_| ())
            .map_err(|e| self.classify("scroll into view", &e))
    }

    async fn click(&self, element: &Element) -> Result<(), BrowserError> {
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| self.classify("click", &e))
    }

    async fn script_click(&self, element: &Element) -> Result<(), BrowserError> {
        element
            .call_js_fn("function() { this.click(); }", false)
            .await
            .map(|_| ())
            .map_err(|e| self.classify("script click", &e))
    }

    async fn scroll_feed(&self, selector: &str) -> Result<Option<u64>, BrowserError> {
        let js = format!(
            "(() => {{ const feed = document.querySelector({}); \
             if (!feed) return -1; \
             feed.scrollTop = feed.scrollHeight; \
             return feed.scrollHeight; }})()",
            js_string(selector)
        );
        let height: i64 = self.evaluate(js).await?;
        Ok(u64::try_from(height).ok())
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let js = format!(
            "(() => {{ const el = document.querySelector({}); \
             return el ? el.innerText : \"\"; }})()",
            js_string(selector)
        );
        // CDP reports a `null` result as having no value, so absence is "".
        let text: String = self.evaluate(js).await?;
        Ok(Some(text).filter(|t| !t.is_empty()))
    }

    async fn history_back(&self) -> Result<(), BrowserError> {
        let _: bool = self
            .evaluate("(() => { window.history.back(); return true; })()".to_string())
            .await?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if !self.find_all(selector).await?.is_empty() {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL).await;
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return;
        };
        if let Err(err) = browser.close().await {
            tracing::debug!(error = %err, "browser close failed");
        }
        if let Err(err) = browser.wait().await {
            tracing::debug!(error = %err, "browser wait failed");
        }
        self.handler_task.abort();
        self.closed.store(true, Ordering::SeqCst);
        tracing::info!("browser session closed");
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::NoDelay;
    use mapscout_core::{Environment, PacingMode};

    fn config(headless: bool) -> AppConfig {
        AppConfig {
            env: Environment::Test,
            log_level: "info".into(),
            output_dir: "out".into(),
            country: "Perú".into(),
            search_base_url: "https://maps.test/".into(),
            headless,
            chrome_path: Some("/opt/chromium/chrome".into()),
            max_results: 20,
            skip_first: 0,
            max_scroll_attempts: 5,
            website_scan_probability: 0.5,
            website_timeout_secs: 8,
            pacing: PacingMode::None,
        }
    }

    #[test]
    fn options_follow_config() {
        let options = SessionOptions::from_config(&config(true), &NoDelay);
        assert!(options.headless);
        assert_eq!(options.chrome_path, Some(PathBuf::from("/opt/chromium/chrome")));
        assert_eq!(options.user_agent, user_agent::USER_AGENTS[0]);
        assert_eq!(options.window, (MIN_WIDTH, MIN_HEIGHT));
    }

    #[test]
    fn window_stays_in_bounds_with_random_pacing() {
        let pacing = crate::pacing::HumanPacing;
        for _ in 0..100 {
            let (w, h) = SessionOptions::from_config(&config(false), &pacing).window;
            assert!((MIN_WIDTH..=MAX_WIDTH).contains(&w));
            assert!((MIN_HEIGHT..=MAX_HEIGHT).contains(&h));
        }
    }

    #[test]
    fn selectors_are_embedded_as_string_literals() {
        assert_eq!(js_string(r#"div[role="feed"]"#), r#""div[role=\"feed\"]""#);
    }
}
