//! hrm-probe: browser acceptance checks for the `OrangeHRM` web application
//!
//! Logs in with credentials read from a spreadsheet fixture, opens each
//! section from the side menu and confirms the landing page by looking for
//! expected tokens in its heading and breadcrumb.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     HRM-PROBE Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Fixture    │    │ Scenario   │    │ Browser    │            │
//! │   │ (.xlsx)    │───►│ Runner     │───►│ Driver     │            │
//! │   │            │    │            │    │ (chromium) │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           │                                     │
//! │            ┌──────────────┼──────────────┐                      │
//! │            ▼              ▼              ▼                      │
//! │      ┌──────────┐  ┌────────────┐  ┌──────────┐                 │
//! │      │ Locator  │  │ Confirm    │  │ Reporter │                 │
//! │      │ fallback │  │ tokens     │  │ (JSON)   │                 │
//! │      └──────────┘  └────────────┘  └──────────┘                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use hrm_probe::prelude::*;
//!
//! let mut driver = MockDriver::new();
//! let config = SuiteConfig::new().with_cleanup(false).with_timeout_ms(10);
//! let row = Row::from_pairs([("Username", "Admin"), ("Password", "admin123")]);
//!
//! // The empty mock has no login form, so the scenario fails cleanly.
//! let outcome = ScenarioRunner::new(config).run(&Scenario::login("smoke"), &row, &mut driver);
//! assert_eq!(outcome.status, Status::Failed);
//! assert!(driver.is_closed());
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod driver;
mod locator;
mod result;
mod wait;

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
mod browser;

#[allow(clippy::cast_possible_truncation)]
mod confirm;
mod fixture;
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
mod sheet;

#[allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]
mod page_object;

mod config;
mod hygiene;
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
mod reporter;
#[allow(clippy::cast_possible_truncation, clippy::module_name_repetitions)]
mod scenario;

#[cfg(feature = "browser")]
pub use browser::CdpDriver;
pub use config::SuiteConfig;
pub use confirm::{
    check_tokens, confirm_tokens, read_confirmation, ConfirmationTarget, ConfirmationText,
    ExpectedTokens, BREADCRUMB_SELECTOR, HEADING_SELECTOR,
};
pub use driver::{BrowserDriver, ClickBehavior, DriverConfig, MockDriver, MockEffect, MockElement};
pub use fixture::{Credentials, Row, PASSWORD_KEYS, USERNAME_KEYS};
pub use hygiene::{HygieneHook, NoopHygiene, ProcessHygiene, KILL_TIMEOUT};
pub use locator::{
    click, is_visible_now, locate, locate_and_click, text_or_empty, CandidateLocator,
    ElementHandle, Selector,
};
pub use page_object::{LoginPage, NavBar, Section, DEFAULT_BASE_URL};
pub use reporter::{CheckOutcome, ScenarioOutcome, Status, SuiteReport};
pub use result::{ProbeError, ProbeResult};
pub use scenario::{
    default_tour, login_matrix, NavigationCheck, Scenario, ScenarioContext, ScenarioRunner,
    ScenarioState, Session,
};
pub use sheet::{coerce_cell, row_from_range, rows_from_range, SheetReader, DEFAULT_SHEET};
pub use wait::{WaitOptions, WaitResult, Waiter, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Prelude for convenient imports
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::confirm::*;
    pub use super::driver::*;
    pub use super::fixture::*;
    pub use super::hygiene::*;
    pub use super::locator::*;
    pub use super::page_object::*;
    pub use super::reporter::*;
    pub use super::result::*;
    pub use super::scenario::*;
    pub use super::sheet::*;
    pub use super::wait::*;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_exposes_runner_surface() {
        let config = SuiteConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(Section::ALL.len(), default_tour().len());
        assert_eq!(Selector::name("username").to_string(), "name=username");
    }
}
