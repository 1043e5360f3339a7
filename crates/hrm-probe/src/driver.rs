//! BrowserDriver - Abstract Browser Automation Trait
//!
//! Everything the scenarios need from a browser goes through [`BrowserDriver`]:
//! element queries, visibility and text reads, native and scripted clicks,
//! form filling and navigation.
//!
//! # Implementations
//!
//! - `CdpDriver` - Chromium over CDP via chromiumoxide (feature `browser`)
//! - [`MockDriver`] - scripted in-memory page for unit and scenario tests
//!
//! The trait is synchronous: a scenario is one linear sequence of blocking
//! actions, and waits are bounded polls on the calling thread.

use crate::locator::{ElementHandle, Selector};
use crate::result::{ProbeError, ProbeResult};
use std::cell::RefCell;
use std::time::Duration;

/// Browser configuration for driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Timeout for navigation
    pub navigation_timeout: Duration,
    /// Executable path override
    pub executable_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            navigation_timeout: Duration::from_secs(30),
            executable_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set chromium executable path
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Abstract driver trait for browser automation
pub trait BrowserDriver {
    /// Navigate to URL
    fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// Get current URL
    fn current_url(&self) -> ProbeResult<String>;

    /// Look up the first element matching `selector`; `Ok(None)` when absent
    fn query(&self, selector: &Selector) -> ProbeResult<Option<ElementHandle>>;

    /// Whether the element is rendered and visible
    fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Rendered text of the element
    fn text(&self, element: &ElementHandle) -> ProbeResult<String>;

    /// Clear the element and type `text` into it
    fn fill(&self, element: &ElementHandle, text: &str) -> ProbeResult<()>;

    /// Native (input-event) click
    fn click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Programmatic `element.click()` inside the page
    fn script_click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Scroll the element to the viewport center
    fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Release the browser session
    fn close(&mut self) -> ProbeResult<()>;
}

impl<D: BrowserDriver + ?Sized> BrowserDriver for &mut D {
    fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        (**self).navigate(url)
    }

    fn current_url(&self) -> ProbeResult<String> {
        (**self).current_url()
    }

    fn query(&self, selector: &Selector) -> ProbeResult<Option<ElementHandle>> {
        (**self).query(selector)
    }

    fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool> {
        (**self).is_visible(element)
    }

    fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        (**self).text(element)
    }

    fn fill(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        (**self).fill(element, text)
    }

    fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        (**self).click(element)
    }

    fn script_click(&self, element: &ElementHandle) -> ProbeResult<()> {
        (**self).script_click(element)
    }

    fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()> {
        (**self).scroll_into_view(element)
    }

    fn close(&mut self) -> ProbeResult<()> {
        (**self).close()
    }
}

// ============================================================================
// Mock driver
// ============================================================================

/// How a mock element reacts to clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickBehavior {
    /// Both native and scripted clicks succeed
    #[default]
    Accept,
    /// Native click is intercepted (overlay), scripted click succeeds
    RejectNative,
    /// Every click fails
    RejectAll,
}

/// Page mutation applied when a mock element is clicked
#[derive(Debug, Clone)]
pub enum MockEffect {
    /// Insert an element, replacing any element with the same selector
    Reveal(MockElement),
    /// Remove every element matching the selector
    Remove(Selector),
    /// Change the current URL
    Navigate(String),
}

/// An element on the scripted mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Selector the element answers to
    pub selector: Selector,
    /// Rendered text
    pub text: String,
    /// Visibility
    pub visible: bool,
    /// Number of queries that miss before the element is present
    pub appears_after: u32,
    /// Click behavior
    pub click: ClickBehavior,
    /// Queries for this element fail with a driver error
    pub query_error: bool,
    /// Effects applied after a successful click
    pub on_click: Vec<MockEffect>,
}

impl MockElement {
    /// Create a visible, immediately present element
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            text: String::new(),
            visible: true,
            appears_after: 0,
            click: ClickBehavior::Accept,
            query_error: false,
            on_click: Vec::new(),
        }
    }

    /// Set the rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Mark the element as present but not visible
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Element shows up only after `misses` queries
    #[must_use]
    pub const fn appears_after(mut self, misses: u32) -> Self {
        self.appears_after = misses;
        self
    }

    /// Set click behavior
    #[must_use]
    pub const fn with_click(mut self, click: ClickBehavior) -> Self {
        self.click = click;
        self
    }

    /// Queries for this element raise a driver error
    #[must_use]
    pub const fn with_query_error(mut self) -> Self {
        self.query_error = true;
        self
    }

    /// Apply `effect` after a successful click
    #[must_use]
    pub fn on_click(mut self, effect: MockEffect) -> Self {
        self.on_click.push(effect);
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    next_id: u64,
    elements: Vec<(String, MockElement)>,
    values: Vec<(String, String)>,
    history: Vec<String>,
    closed: bool,
}

impl MockState {
    fn insert(&mut self, element: MockElement) {
        self.elements.retain(|(_, e)| e.selector != element.selector);
        self.next_id += 1;
        self.elements.push((format!("mock-{}", self.next_id), element));
    }

    fn get(&self, handle: &ElementHandle) -> ProbeResult<&MockElement> {
        self.elements
            .iter()
            .find(|(id, _)| *id == handle.id)
            .map(|(_, e)| e)
            .ok_or_else(|| ProbeError::driver(format!("stale element reference: {}", handle)))
    }

    fn apply(&mut self, effects: Vec<MockEffect>) {
        for effect in effects {
            match effect {
                MockEffect::Reveal(element) => self.insert(element),
                MockEffect::Remove(selector) => {
                    self.elements.retain(|(_, e)| e.selector != selector);
                }
                MockEffect::Navigate(url) => self.url = url,
            }
        }
    }
}

/// Mock driver for unit testing
///
/// A scripted in-memory page. Elements are matched by selector equality,
/// clicks can reveal or replace elements, and every call is recorded so tests
/// can assert exactly which selectors were probed.
#[derive(Debug, Default)]
pub struct MockDriver {
    state: RefCell<MockState>,
}

impl MockDriver {
    /// Create new mock driver with an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element (builder style)
    #[must_use]
    pub fn with_element(self, element: MockElement) -> Self {
        self.add_element(element);
        self
    }

    /// Add an element, replacing any element with the same selector
    pub fn add_element(&self, element: MockElement) {
        self.state.borrow_mut().insert(element);
    }

    /// Remove every element matching `selector`
    pub fn remove_element(&self, selector: &Selector) {
        self.state
            .borrow_mut()
            .elements
            .retain(|(_, e)| e.selector != *selector);
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }

    /// Check if a call starting with `prefix` was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.state
            .borrow()
            .history
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    /// Number of queries made for `selector`
    #[must_use]
    pub fn query_count(&self, selector: &Selector) -> usize {
        let key = format!("query:{selector}");
        self.state
            .borrow()
            .history
            .iter()
            .filter(|c| **c == key)
            .count()
    }

    /// Value last typed into the element matching `selector`
    #[must_use]
    pub fn value_of(&self, selector: &Selector) -> Option<String> {
        let state = self.state.borrow();
        let id = state
            .elements
            .iter()
            .find(|(_, e)| e.selector == *selector)
            .map(|(id, _)| id.clone())?;
        state
            .values
            .iter()
            .find(|(v_id, _)| *v_id == id)
            .map(|(_, v)| v.clone())
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().history.push(call);
    }
}

impl BrowserDriver for MockDriver {
    fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.record(format!("navigate:{url}"));
        self.state.borrow_mut().url = url.to_string();
        Ok(())
    }

    fn current_url(&self) -> ProbeResult<String> {
        Ok(self.state.borrow().url.clone())
    }

    fn query(&self, selector: &Selector) -> ProbeResult<Option<ElementHandle>> {
        self.record(format!("query:{selector}"));
        let mut state = self.state.borrow_mut();
        let Some((id, element)) = state
            .elements
            .iter_mut()
            .find(|(_, e)| e.selector == *selector)
        else {
            return Ok(None);
        };
        if element.query_error {
            return Err(ProbeError::driver(format!("query failed for {selector}")));
        }
        if element.appears_after > 0 {
            element.appears_after -= 1;
            return Ok(None);
        }
        Ok(Some(ElementHandle::new(id.clone(), selector.clone())))
    }

    fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool> {
        self.record(format!("visible:{}", element.selector));
        Ok(self.state.borrow().get(element)?.visible)
    }

    fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        self.record(format!("text:{}", element.selector));
        Ok(self.state.borrow().get(element)?.text.clone())
    }

    fn fill(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        self.record(format!("fill:{}", element.selector));
        let mut state = self.state.borrow_mut();
        let _ = state.get(element)?;
        state.values.retain(|(id, _)| *id != element.id);
        state.values.push((element.id.clone(), text.to_string()));
        Ok(())
    }

    fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.record(format!("click:{}", element.selector));
        let mut state = self.state.borrow_mut();
        let target = state.get(element)?;
        let (behavior, effects) = (target.click, target.on_click.clone());
        match behavior {
            ClickBehavior::Accept => {
                state.apply(effects);
                Ok(())
            }
            ClickBehavior::RejectNative | ClickBehavior::RejectAll => Err(ProbeError::driver(
                format!("element click intercepted: {}", element.selector),
            )),
        }
    }

    fn script_click(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.record(format!("script_click:{}", element.selector));
        let mut state = self.state.borrow_mut();
        let target = state.get(element)?;
        let (behavior, effects) = (target.click, target.on_click.clone());
        match behavior {
            ClickBehavior::Accept | ClickBehavior::RejectNative => {
                state.apply(effects);
                Ok(())
            }
            ClickBehavior::RejectAll => Err(ProbeError::driver(format!(
                "script click failed: {}",
                element.selector
            ))),
        }
    }

    fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.record(format!("scroll:{}", element.selector));
        self.state.borrow().get(element).map(|_| ())
    }

    fn close(&mut self) -> ProbeResult<()> {
        self.record("close".to_string());
        self.state.borrow_mut().closed = true;
        Ok(())
    }
}
