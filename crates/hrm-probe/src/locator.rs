//! Locator abstraction for element selection and interaction.
//!
//! A UI target that is addressed differently across application versions is
//! described by a [`CandidateLocator`]: an ordered list of [`Selector`]s.
//! [`locate`] walks that list in order and polls each candidate until it
//! resolves; the first match wins and later candidates are never queried.
//!
//! [`click`] scrolls the element into view (best-effort), tries a native
//! click and falls back to a scripted `element.click()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::driver::BrowserDriver;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Waiter;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "lowercase")]
pub enum Selector {
    /// CSS selector (e.g., "button[type='submit']")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Form control `name` attribute
    Name(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a `name` attribute selector
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// CSS form of the selector, if it has one
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Css(s) => Some(s.clone()),
            Self::Name(n) => Some(format!("[name={n:?}]")),
            Self::XPath(_) => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Name(s) => write!(f, "name={s}"),
        }
    }
}

/// Handle to a resolved element
///
/// The id is issued by the driver and is only meaningful to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Driver-issued identifier
    pub id: String,
    /// Selector that produced this handle
    pub selector: Selector,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, selector: Selector) -> Self {
        Self {
            id: id.into(),
            selector,
        }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.selector, self.id)
    }
}

/// Ordered alternatives for one logical UI target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLocator {
    name: String,
    candidates: Vec<Selector>,
}

impl CandidateLocator {
    /// Create a locator from an ordered list of candidates
    #[must_use]
    pub fn new(name: impl Into<String>, candidates: Vec<Selector>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    /// Locator with a single candidate
    #[must_use]
    pub fn single(name: impl Into<String>, selector: Selector) -> Self {
        Self::new(name, vec![selector])
    }

    /// Append a fallback candidate
    #[must_use]
    pub fn or(mut self, selector: Selector) -> Self {
        self.candidates.push(selector);
        self
    }

    /// Logical target name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidates in priority order
    #[must_use]
    pub fn candidates(&self) -> &[Selector] {
        &self.candidates
    }
}

/// Resolve the first candidate that becomes present.
///
/// Each candidate is polled for up to the waiter's timeout before moving on.
/// Driver errors while probing count as "not present yet".
///
/// # Errors
///
/// Returns [`ProbeError::NotFound`] listing every candidate tried.
pub fn locate<D>(
    driver: &D,
    locator: &CandidateLocator,
    waiter: &Waiter,
) -> ProbeResult<ElementHandle>
where
    D: BrowserDriver + ?Sized,
{
    let mut tried = Vec::with_capacity(locator.candidates.len());

    for (index, selector) in locator.candidates.iter().enumerate() {
        debug!(target_name = %locator.name, candidate = index + 1, %selector, "trying selector");
        tried.push(selector.to_string());

        let found = waiter.poll(|| match driver.query(selector) {
            Ok(handle) => handle,
            Err(e) => {
                debug!(%selector, error = %e, "query failed");
                None
            }
        });

        if let Some(result) = found {
            info!(
                target_name = %locator.name,
                candidate = index + 1,
                %selector,
                attempts = result.attempts,
                "located element"
            );
            return Ok(result.value);
        }
        debug!(target_name = %locator.name, %selector, "no element within timeout");
    }

    Err(ProbeError::NotFound {
        target: locator.name.clone(),
        tried,
    })
}

/// Click with scroll-into-view and scripted fallback.
///
/// # Errors
///
/// Returns [`ProbeError::ClickIntercepted`] when both clicks fail.
pub fn click<D>(driver: &D, element: &ElementHandle) -> ProbeResult<()>
where
    D: BrowserDriver + ?Sized,
{
    if let Err(e) = driver.scroll_into_view(element) {
        warn!(%element, error = %e, "scroll into view failed");
    }

    match driver.click(element) {
        Ok(()) => Ok(()),
        Err(native) => {
            debug!(%element, error = %native, "native click failed, using scripted click");
            driver
                .script_click(element)
                .map_err(|scripted| ProbeError::ClickIntercepted {
                    target: element.selector.to_string(),
                    native: native.to_string(),
                    scripted: scripted.to_string(),
                })
        }
    }
}

/// [`locate`] then [`click`]
///
/// # Errors
///
/// Propagates `NotFound` or `ClickIntercepted`.
pub fn locate_and_click<D>(
    driver: &D,
    locator: &CandidateLocator,
    waiter: &Waiter,
) -> ProbeResult<ElementHandle>
where
    D: BrowserDriver + ?Sized,
{
    let element = locate(driver, locator, waiter)?;
    click(driver, &element)?;
    Ok(element)
}

/// Whether an element matching `selector` is visible right now.
///
/// Absence and driver errors both read as not visible.
pub fn is_visible_now<D>(driver: &D, selector: &Selector) -> bool
where
    D: BrowserDriver + ?Sized,
{
    match driver.query(selector) {
        Ok(Some(element)) => driver.is_visible(&element).unwrap_or(false),
        Ok(None) | Err(_) => false,
    }
}

/// Text of the element matching `selector`, or `""` on any failure.
pub fn text_or_empty<D>(driver: &D, selector: &Selector) -> String
where
    D: BrowserDriver + ?Sized,
{
    let text = driver
        .query(selector)
        .and_then(|found| match found {
            Some(element) => driver.text(&element),
            None => Ok(String::new()),
        });
    match text {
        Ok(text) => text,
        Err(e) => {
            warn!(%selector, error = %e, "could not read text");
            String::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::{ClickBehavior, MockDriver, MockEffect, MockElement};
    use crate::wait::WaitOptions;

    fn waiter(timeout_ms: u64) -> Waiter {
        Waiter::new(
            WaitOptions::new()
                .with_timeout(timeout_ms)
                .with_poll_interval(1),
        )
    }

    fn leave_candidates() -> CandidateLocator {
        CandidateLocator::new(
            "Leave tab",
            vec![
                Selector::xpath("//span[normalize-space()='Leave']"),
                Selector::xpath("//a[contains(@href,'leave')]"),
                Selector::xpath("//aside//span[normalize-space()='Leave']"),
                Selector::css("a.oxd-main-menu-item[href*='leave']"),
            ],
        )
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_display() {
            assert_eq!(Selector::css("h6.oxd-text").to_string(), "css=h6.oxd-text");
            assert_eq!(Selector::name("username").to_string(), "name=username");
            assert_eq!(Selector::xpath("//a").to_string(), "xpath=//a");
        }

        #[test]
        fn test_to_css() {
            assert_eq!(
                Selector::name("password").to_css().as_deref(),
                Some("[name=\"password\"]")
            );
            assert_eq!(Selector::css("a").to_css().as_deref(), Some("a"));
            assert!(Selector::xpath("//a").to_css().is_none());
        }

        #[test]
        fn test_serde_shape() {
            let json = serde_json::to_string(&Selector::css("h6")).unwrap();
            assert_eq!(json, r#"{"by":"css","value":"h6"}"#);
            let back: Selector = serde_json::from_str(r#"{"by":"xpath","value":"//a"}"#).unwrap();
            assert_eq!(back, Selector::xpath("//a"));
        }

        #[test]
        fn test_candidate_builder() {
            let loc = CandidateLocator::single("x", Selector::css("a")).or(Selector::css("b"));
            assert_eq!(loc.name(), "x");
            assert_eq!(loc.candidates().len(), 2);
        }
    }

    mod locate_tests {
        use super::*;

        #[test]
        fn test_first_candidate_wins() {
            let loc = leave_candidates();
            let driver = MockDriver::new()
                .with_element(MockElement::new(loc.candidates()[0].clone()))
                .with_element(MockElement::new(loc.candidates()[1].clone()));

            let handle = locate(&driver, &loc, &waiter(50)).unwrap();
            assert_eq!(handle.selector, loc.candidates()[0]);
            for later in &loc.candidates()[1..] {
                assert_eq!(driver.query_count(later), 0);
            }
        }

        #[test]
        fn test_kth_only_resolvable_candidate() {
            let loc = leave_candidates();
            for k in 0..loc.candidates().len() {
                let driver =
                    MockDriver::new().with_element(MockElement::new(loc.candidates()[k].clone()));
                let handle = locate(&driver, &loc, &waiter(5)).unwrap();

                let direct = driver.query(&loc.candidates()[k]).unwrap().unwrap();
                assert_eq!(handle, direct);
                for earlier in &loc.candidates()[..k] {
                    assert!(driver.query_count(earlier) >= 1);
                }
                for later in &loc.candidates()[k + 1..] {
                    assert_eq!(driver.query_count(later), 0, "probed {later} after success");
                }
            }
        }

        #[test]
        fn test_not_found_after_every_candidate() {
            let loc = leave_candidates();
            let driver = MockDriver::new();
            let err = locate(&driver, &loc, &waiter(3)).unwrap_err();
            match err {
                ProbeError::NotFound { target, tried } => {
                    assert_eq!(target, "Leave tab");
                    assert_eq!(tried.len(), 4);
                }
                other => panic!("unexpected error: {other}"),
            }
            for candidate in loc.candidates() {
                assert!(driver.query_count(candidate) >= 1);
            }
        }

        #[test]
        fn test_zero_timeout_still_probes_each_candidate() {
            let loc = leave_candidates();
            let driver = MockDriver::new();
            assert!(locate(&driver, &loc, &waiter(0)).is_err());
            for candidate in loc.candidates() {
                assert_eq!(driver.query_count(candidate), 1);
            }
        }

        #[test]
        fn test_waits_for_late_candidate() {
            let loc = CandidateLocator::single("PIM tab", Selector::css("a.pim"));
            let driver = MockDriver::new()
                .with_element(MockElement::new(Selector::css("a.pim")).appears_after(3));
            let handle = locate(&driver, &loc, &waiter(1_000)).unwrap();
            assert_eq!(handle.selector, Selector::css("a.pim"));
            assert_eq!(driver.query_count(&Selector::css("a.pim")), 4);
        }

        #[test]
        fn test_query_errors_fall_through() {
            let loc = CandidateLocator::new(
                "menu",
                vec![Selector::css("broken"), Selector::css("ok")],
            );
            let driver = MockDriver::new()
                .with_element(MockElement::new(Selector::css("broken")).with_query_error())
                .with_element(MockElement::new(Selector::css("ok")));
            let handle = locate(&driver, &loc, &waiter(5)).unwrap();
            assert_eq!(handle.selector, Selector::css("ok"));
        }
    }

    mod click_tests {
        use super::*;

        #[test]
        fn test_native_click() {
            let sel = Selector::css("button");
            let driver = MockDriver::new().with_element(MockElement::new(sel.clone()));
            let handle = driver.query(&sel).unwrap().unwrap();
            click(&driver, &handle).unwrap();
            assert!(driver.was_called("scroll:"));
            assert!(driver.was_called("click:"));
            assert!(!driver.was_called("script_click:"));
        }

        #[test]
        fn test_scripted_fallback() {
            let sel = Selector::css("button");
            let driver = MockDriver::new().with_element(
                MockElement::new(sel.clone())
                    .with_click(ClickBehavior::RejectNative)
                    .on_click(MockEffect::Navigate("https://app/next".to_string())),
            );
            let handle = driver.query(&sel).unwrap().unwrap();
            click(&driver, &handle).unwrap();
            assert!(driver.was_called("script_click:"));
            assert_eq!(driver.current_url().unwrap(), "https://app/next");
        }

        #[test]
        fn test_both_clicks_fail() {
            let sel = Selector::css("button");
            let driver = MockDriver::new()
                .with_element(MockElement::new(sel.clone()).with_click(ClickBehavior::RejectAll));
            let handle = driver.query(&sel).unwrap().unwrap();
            let err = click(&driver, &handle).unwrap_err();
            assert!(matches!(err, ProbeError::ClickIntercepted { .. }));
        }

        #[test]
        fn test_locate_and_click() {
            let loc = leave_candidates();
            let driver = MockDriver::new()
                .with_element(MockElement::new(loc.candidates()[3].clone()));
            let handle = locate_and_click(&driver, &loc, &waiter(2)).unwrap();
            assert_eq!(handle.selector, loc.candidates()[3]);
            assert!(driver.was_called("click:css=a.oxd-main-menu-item"));
        }
    }

    mod read_tests {
        use super::*;

        #[test]
        fn test_visibility_probe() {
            let shown = Selector::css("h6");
            let hidden = Selector::css(".crumb");
            let driver = MockDriver::new()
                .with_element(MockElement::new(shown.clone()))
                .with_element(MockElement::new(hidden.clone()).hidden());
            assert!(is_visible_now(&driver, &shown));
            assert!(!is_visible_now(&driver, &hidden));
            assert!(!is_visible_now(&driver, &Selector::css("missing")));
        }

        #[test]
        fn test_text_or_empty() {
            let sel = Selector::css("h6");
            let driver = MockDriver::new()
                .with_element(MockElement::new(sel.clone()).with_text("PIM"))
                .with_element(MockElement::new(Selector::css("bad")).with_query_error());
            assert_eq!(text_or_empty(&driver, &sel), "PIM");
            assert_eq!(text_or_empty(&driver, &Selector::css("missing")), "");
            assert_eq!(text_or_empty(&driver, &Selector::css("bad")), "");
        }
    }
}
