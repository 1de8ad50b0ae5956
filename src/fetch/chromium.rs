//! Headless Chromium backend for the rendered-page strategy

use super::rendered::{FieldSelector, PageDriver, RenderedPage};
use super::FetchFailure;
use crate::config::{BrowserConfig, HttpConfig};
use crate::ScrapeError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

impl From<CdpError> for FetchFailure {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::Timeout => Self::Timeout,
            other => Self::Browser(other.to_string()),
        }
    }
}

/// A running browser that opens one tab per target
pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launches the browser and starts its event loop
    pub async fn launch(browser: &BrowserConfig, http: &HttpConfig) -> Result<Self, ScrapeError> {
        let mut builder = LaunchConfig::builder()
            .request_timeout(Duration::from_secs(browser.navigation_timeout_secs))
            .arg(format!("--user-agent={}", http.user_agent))
            .arg(format!("--lang={}", http.accept_language));
        if !browser.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScrapeError::Browser)?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!("Browser event loop ended: {}", e);
                    break;
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
        })
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn open(&self, url: &str, timeout: Duration) -> Result<Box<dyn RenderedPage>, FetchFailure> {
        let browser = self.browser.lock().await;
        let opened = tokio::time::timeout(timeout, async {
            let page = browser.new_page(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, CdpError>(page)
        })
        .await
        .map_err(|_| FetchFailure::Timeout)??;

        Ok(Box::new(ChromiumPage { page: opened }))
    }
}

/// One browser tab; closed on drop
struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, FetchFailure> {
        self.page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| FetchFailure::MalformedPayload(e.to_string()))
    }
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        let page = self.page.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}

/// JSON-quotes a value for embedding in a script
fn js(value: &str) -> String {
    Value::from(value).to_string()
}

#[async_trait]
impl RenderedPage for ChromiumPage {
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), FetchFailure> {
        let script = format!("document.querySelector({}) !== null", js(selector));
        let found = tokio::time::timeout(timeout, async {
            loop {
                if self.eval::<bool>(script.clone()).await? {
                    return Ok::<_, FetchFailure>(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;

        match found {
            Ok(result) => result,
            Err(_) => Err(FetchFailure::MissingElement(selector.to_string())),
        }
    }

    async fn text(&self, selector: &str) -> Result<Option<String>, FetchFailure> {
        self.eval(format!(
            "(() => {{ const e = document.querySelector({}); return e ? e.textContent : null; }})()",
            js(selector)
        ))
        .await
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, FetchFailure> {
        self.eval(format!(
            "(() => {{ const e = document.querySelector({}); return e ? e.getAttribute({}) : null; }})()",
            js(selector),
            js(name)
        ))
        .await
    }

    async fn collect(
        &self,
        item_selector: &str,
        fields: &[FieldSelector],
    ) -> Result<Vec<Value>, FetchFailure> {
        let fields: Vec<Value> = fields
            .iter()
            .map(|f| json!({"key": f.key, "selector": f.selector, "attribute": f.attribute}))
            .collect();

        self.eval(format!(
            "(() => {{
                const fields = {};
                return Array.from(document.querySelectorAll({})).map(item => {{
                    const out = {{}};
                    for (const f of fields) {{
                        const el = f.selector ? item.querySelector(f.selector) : item;
                        out[f.key] = el ? (f.attribute ? el.getAttribute(f.attribute) : el.textContent) : null;
                    }}
                    return out;
                }});
            }})()",
            Value::Array(fields),
            js(item_selector)
        ))
        .await
    }

    async fn scroll_to_bottom(&self) -> Result<(), FetchFailure> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    async fn content_height(&self) -> Result<u64, FetchFailure> {
        self.eval("document.body.scrollHeight".to_string()).await
    }
}
