//! Chromium driver over the Chrome `DevTools` Protocol.
//!
//! [`CdpDriver`] implements [`BrowserDriver`] with chromiumoxide. chromiumoxide
//! is async; the driver owns a current-thread tokio runtime and blocks on each
//! call, so scenarios stay synchronous. The CDP handler task only makes
//! progress inside those `block_on` calls, which is all it needs.

use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::future::LocalBoxFuture;
use futures::StreamExt;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::driver::{BrowserDriver, DriverConfig};
use crate::locator::{ElementHandle, Selector};
use crate::result::{ProbeError, ProbeResult};

const JS_IS_VISIBLE: &str = "function() { \
    const r = this.getBoundingClientRect(); \
    const s = window.getComputedStyle(this); \
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; \
}";

const JS_CLICK: &str = "function() { this.click(); }";

const JS_SCROLL_CENTER: &str =
    "function() { this.scrollIntoView({ block: 'center', inline: 'center' }); }";

const JS_CLEAR: &str = "function() { \
    this.value = ''; \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
}";

/// How a [`Selector`] is sent over CDP
#[derive(Debug, Clone, PartialEq, Eq)]
enum Query {
    Css(String),
    XPath(String),
}

impl Query {
    fn from_selector(selector: &Selector) -> Self {
        match selector {
            Selector::XPath(expr) => Self::XPath(expr.clone()),
            other => Self::Css(other.to_css().unwrap_or_default()),
        }
    }
}

/// Live elements, one per selector.
///
/// Re-querying a selector replaces its element under the same id, so the
/// registry never holds more entries than distinct selectors seen since the
/// last navigation. Handles issued earlier for that selector see the fresh
/// element.
struct HandleRegistry<E> {
    ids: HashMap<String, String>,
    elements: HashMap<String, E>,
}

impl<E> HandleRegistry<E> {
    fn new() -> Self {
        Self {
            ids: HashMap::new(),
            elements: HashMap::new(),
        }
    }

    fn register(&mut self, selector: &Selector, element: E) -> String {
        let id = self
            .ids
            .entry(selector.to_string())
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        self.elements.insert(id.clone(), element);
        id
    }

    fn get(&self, id: &str) -> Option<&E> {
        self.elements.get(id)
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.elements.clear();
    }
}

/// Chromium browser with a single page
pub struct CdpDriver {
    runtime: Runtime,
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    elements: Mutex<HandleRegistry<Element>>,
    closed: bool,
}

impl fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpDriver")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl CdpDriver {
    /// Launch Chromium and open a blank page
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::BrowserLaunchError`] when the runtime, the
    /// browser or the first page cannot be created.
    pub fn launch(config: &DriverConfig) -> ProbeResult<Self> {
        let launch_error = |message: String| ProbeError::BrowserLaunchError { message };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| launch_error(e.to_string()))?;

        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                ..Viewport::default()
            })
            .request_timeout(config.navigation_timeout);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(launch_error)?;

        let (browser, page, handler) = runtime.block_on(async {
            let (browser, mut handler) = Browser::launch(cdp_config)
                .await
                .map_err(|e| launch_error(e.to_string()))?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| launch_error(e.to_string()))?;
            Ok::<_, ProbeError>((browser, page, handler))
        })?;

        info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            "chromium launched"
        );

        Ok(Self {
            runtime,
            browser,
            page,
            handler,
            elements: Mutex::new(HandleRegistry::new()),
            closed: false,
        })
    }

    fn elements(&self) -> ProbeResult<MutexGuard<'_, HandleRegistry<Element>>> {
        self.elements
            .lock()
            .map_err(|_| ProbeError::driver("element registry poisoned"))
    }

    /// Run `f` against the live element behind `handle`
    fn with_element<T, F>(&self, handle: &ElementHandle, what: &str, f: F) -> ProbeResult<T>
    where
        F: for<'e> FnOnce(&'e Element) -> LocalBoxFuture<'e, chromiumoxide::Result<T>>,
    {
        let elements = self.elements()?;
        let element = elements
            .get(&handle.id)
            .ok_or_else(|| ProbeError::driver(format!("stale element reference: {handle}")))?;
        self.runtime
            .block_on(f(element))
            .map_err(|e| ProbeError::driver(format!("{what} failed on {}: {e}", handle.selector)))
    }

    fn call_js(
        &self,
        handle: &ElementHandle,
        what: &str,
        function: &'static str,
    ) -> ProbeResult<Option<serde_json::Value>> {
        self.with_element(handle, what, |el| {
            Box::pin(async move { el.call_js_fn(function, false).await.map(|r| r.result.value) })
        })
    }
}

impl BrowserDriver for CdpDriver {
    fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        debug!(url, "navigating");
        self.elements()?.clear();
        let page = &self.page;
        self.runtime
            .block_on(async {
                page.goto(url).await?;
                page.wait_for_navigation().await.map(|_| ())
            })
            .map_err(|e| ProbeError::NavigationError {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    fn current_url(&self) -> ProbeResult<String> {
        self.runtime
            .block_on(self.page.url())
            .map(Option::unwrap_or_default)
            .map_err(|e| ProbeError::driver(e.to_string()))
    }

    fn query(&self, selector: &Selector) -> ProbeResult<Option<ElementHandle>> {
        let page = &self.page;
        let found = self
            .runtime
            .block_on(async {
                match Query::from_selector(selector) {
                    Query::Css(css) => page.find_elements(css).await,
                    Query::XPath(xpath) => page.find_xpaths(xpath).await,
                }
            })
            .map_err(|e| ProbeError::driver(format!("query {selector} failed: {e}")))?;

        let Some(element) = found.into_iter().next() else {
            return Ok(None);
        };
        let mut elements = self.elements()?;
        let id = elements.register(selector, element);
        debug!(%selector, live = elements.len(), "element registered");
        Ok(Some(ElementHandle::new(id, selector.clone())))
    }

    fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self
            .call_js(element, "visibility check", JS_IS_VISIBLE)?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        self.with_element(element, "text read", |el| {
            Box::pin(async move { el.inner_text().await.map(Option::unwrap_or_default) })
        })
    }

    fn fill(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        self.call_js(element, "clear", JS_CLEAR)?;
        let text = text.to_string();
        self.with_element(element, "typing", move |el| {
            Box::pin(async move {
                el.focus().await?;
                el.type_str(&text).await.map(|_| ())
            })
        })
    }

    fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.with_element(element, "click", |el| {
            Box::pin(async move { el.click().await.map(|_| ()) })
        })
    }

    fn script_click(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.call_js(element, "scripted click", JS_CLICK).map(|_| ())
    }

    fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.call_js(element, "scroll", JS_SCROLL_CENTER).map(|_| ())
    }

    fn close(&mut self) -> ProbeResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.elements()?.clear();

        let browser = &mut self.browser;
        let result = self.runtime.block_on(async {
            browser.close().await.map_err(|e| e.to_string())?;
            browser.wait().await.map_err(|e| e.to_string())?;
            Ok::<_, String>(())
        });
        self.handler.abort();

        match result {
            Ok(()) => {
                info!("chromium closed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "chromium did not close cleanly");
                Err(ProbeError::driver(format!("close failed: {e}")))
            }
        }
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}
