//! Navigation confirmation.
//!
//! After a navigation the page shows a heading, a breadcrumb trail, or both.
//! Confirmation waits for either to become visible, reads both texts
//! tolerantly and requires every `/`-separated token of the expected string to
//! appear somewhere in `heading + " " + breadcrumb`.
//!
//! When neither element shows up in time the check still runs, against empty
//! text, so the failure surfaces as a missing-token assertion that carries the
//! observed text.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::driver::BrowserDriver;
use crate::locator::{is_visible_now, text_or_empty, Selector};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Waiter;

/// Heading shown at the top of every OrangeHRM module page
pub const HEADING_SELECTOR: &str = "h6.oxd-text";

/// Breadcrumb trail next to the heading
pub const BREADCRUMB_SELECTOR: &str = ".oxd-topbar-header-breadcrumb";

/// Heading/breadcrumb pair whose text confirms a navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationTarget {
    /// Primary heading
    pub heading: Selector,
    /// Breadcrumb trail
    pub breadcrumb: Selector,
}

impl Default for ConfirmationTarget {
    fn default() -> Self {
        Self {
            heading: Selector::css(HEADING_SELECTOR),
            breadcrumb: Selector::css(BREADCRUMB_SELECTOR),
        }
    }
}

impl ConfirmationTarget {
    /// Create a target from explicit selectors
    #[must_use]
    pub const fn new(heading: Selector, breadcrumb: Selector) -> Self {
        Self {
            heading,
            breadcrumb,
        }
    }
}

/// Tokens that must all appear in the confirmation text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedTokens(Vec<String>);

impl ExpectedTokens {
    /// Split `expected` on `/`, trim each token and drop empty ones
    #[must_use]
    pub fn parse(expected: &str) -> Self {
        Self(
            expected
                .split('/')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Parsed tokens
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Whether the expected string contained no tokens
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First token that is not a substring of `combined`
    #[must_use]
    pub fn first_missing(&self, combined: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|t| !combined.contains(t.as_str()))
            .map(String::as_str)
    }
}

/// Check every token of `expected` against `combined`.
///
/// # Errors
///
/// Returns [`ProbeError::AssertionFailed`] naming the first missing token.
pub fn check_tokens(expected: &str, combined: &str) -> ProbeResult<()> {
    let tokens = ExpectedTokens::parse(expected);
    match tokens.first_missing(combined) {
        None => Ok(()),
        Some(token) => Err(ProbeError::AssertionFailed {
            token: token.to_string(),
            actual: combined.to_string(),
        }),
    }
}

/// Texts read from the confirmation target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationText {
    /// Heading text (empty if unreadable)
    pub heading: String,
    /// Breadcrumb text (empty if unreadable)
    pub breadcrumb: String,
}

impl ConfirmationText {
    /// `heading + " " + breadcrumb`
    #[must_use]
    pub fn combined(&self) -> String {
        format!("{} {}", self.heading, self.breadcrumb)
    }
}

/// Wait for the heading or the breadcrumb to become visible, then read both.
///
/// Never fails: a timeout is logged and unreadable elements yield `""`.
pub fn read_confirmation<D>(
    driver: &D,
    target: &ConfirmationTarget,
    waiter: &Waiter,
) -> ConfirmationText
where
    D: BrowserDriver + ?Sized,
{
    let appeared = waiter.poll(|| {
        if is_visible_now(driver, &target.heading) {
            Some(&target.heading)
        } else if is_visible_now(driver, &target.breadcrumb) {
            Some(&target.breadcrumb)
        } else {
            None
        }
    });

    match appeared {
        Some(result) => debug!(
            selector = %result.value,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "confirmation element visible"
        ),
        None => warn!(
            timeout_ms = waiter.options().timeout_ms,
            "neither heading nor breadcrumb became visible"
        ),
    }

    ConfirmationText {
        heading: text_or_empty(driver, &target.heading),
        breadcrumb: text_or_empty(driver, &target.breadcrumb),
    }
}

/// Confirm a navigation against an expected-token string.
///
/// # Errors
///
/// Returns [`ProbeError::AssertionFailed`] when a token is absent.
pub fn confirm_tokens<D>(
    driver: &D,
    target: &ConfirmationTarget,
    expected: &str,
    waiter: &Waiter,
) -> ProbeResult<()>
where
    D: BrowserDriver + ?Sized,
{
    let text = read_confirmation(driver, target, waiter);
    let combined = text.combined();
    debug!(heading = %text.heading, breadcrumb = %text.breadcrumb, "confirmation text");

    check_tokens(expected, &combined)?;
    info!(expected, "navigation confirmed");
    Ok(())
}
