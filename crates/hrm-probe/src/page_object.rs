//! Page Object Model
//!
//! The HRM pages the scenarios touch, each owning its candidate locator
//! chains:
//!
//! - [`LoginPage`] - credentials form, dashboard marker, error banners
//! - [`Section`] - the eleven modules reachable from the side menu
//! - [`NavBar`] - opens a section and confirms the landing page
//!
//! Selectors live here and nowhere else; scenario code only talks to pages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::confirm::{confirm_tokens, ConfirmationTarget, HEADING_SELECTOR};
use crate::driver::BrowserDriver;
use crate::fixture::Credentials;
use crate::locator::{
    click, is_visible_now, locate, locate_and_click, text_or_empty, CandidateLocator, Selector,
};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Waiter;

/// Public OrangeHRM demo instance
pub const DEFAULT_BASE_URL: &str = "https://opensource-demo.orangehrmlive.com/";

// ============================================================================
// Login page
// ============================================================================

/// Login form and post-login dashboard marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPage {
    /// Username input
    pub username: CandidateLocator,
    /// Password input
    pub password: CandidateLocator,
    /// Submit button
    pub submit: CandidateLocator,
    /// Element visible once the dashboard has loaded
    pub dashboard_marker: Selector,
    /// Login error banners, most specific first
    pub error_banner: CandidateLocator,
}

impl Default for LoginPage {
    fn default() -> Self {
        Self {
            username: CandidateLocator::single("username field", Selector::name("username"))
                .or(Selector::css("input[name='username']")),
            password: CandidateLocator::single("password field", Selector::name("password"))
                .or(Selector::css("input[name='password']")),
            submit: CandidateLocator::single("login button", Selector::css("button[type='submit']"))
                .or(Selector::xpath("//button[normalize-space()='Login']")),
            dashboard_marker: Selector::css(HEADING_SELECTOR),
            error_banner: CandidateLocator::new(
                "login error",
                vec![
                    Selector::css(".oxd-alert-content-text"),
                    Selector::css(".oxd-alert-content"),
                    Selector::css(".alert-content"),
                    Selector::css(".oxd-input-field-error-message"),
                    Selector::css(".oxd-text--toast-message"),
                ],
            ),
        }
    }
}

impl LoginPage {
    /// Login page with the stock selectors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigate to the login page
    ///
    /// # Errors
    ///
    /// Propagates driver navigation errors.
    pub fn open<D>(&self, driver: &mut D, base_url: &str) -> ProbeResult<()>
    where
        D: BrowserDriver + ?Sized,
    {
        info!(url = base_url, "opening login page");
        driver.navigate(base_url)?;
        debug!(url = %driver.current_url().unwrap_or_default(), "landed");
        Ok(())
    }

    /// Fill both fields and submit
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing control, `ClickIntercepted` for the submit.
    pub fn login<D>(&self, driver: &D, credentials: &Credentials, waiter: &Waiter) -> ProbeResult<()>
    where
        D: BrowserDriver + ?Sized,
    {
        info!(username = %credentials.username, "logging in");

        let username = locate(driver, &self.username, waiter)?;
        driver.fill(&username, &credentials.username)?;

        let password = locate(driver, &self.password, waiter)?;
        driver.fill(&password, &credentials.password)?;

        let submit = locate(driver, &self.submit, waiter)?;
        click(driver, &submit)
    }

    /// Whether the dashboard marker becomes visible within the wait
    pub fn is_dashboard_displayed<D>(&self, driver: &D, waiter: &Waiter) -> bool
    where
        D: BrowserDriver + ?Sized,
    {
        waiter
            .poll(|| is_visible_now(driver, &self.dashboard_marker).then_some(()))
            .is_some()
    }

    /// Text of the first visible login error banner
    ///
    /// # Errors
    ///
    /// `NotFound` when no banner becomes visible within the wait.
    pub fn error_text<D>(&self, driver: &D, waiter: &Waiter) -> ProbeResult<String>
    where
        D: BrowserDriver + ?Sized,
    {
        let banners = self.error_banner.candidates();
        let found = waiter.poll(|| banners.iter().find(|s| is_visible_now(driver, s)));

        match found {
            Some(result) => Ok(text_or_empty(driver, result.value)),
            None => Err(ProbeError::NotFound {
                target: self.error_banner.name().to_string(),
                tried: banners.iter().map(ToString::to_string).collect(),
            }),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Modules reachable from the side menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    /// User management and organisation setup
    Admin,
    /// Personnel information management
    #[serde(rename = "PIM")]
    Pim,
    /// Leave requests and entitlements
    Leave,
    /// Timesheets and attendance
    Time,
    /// Vacancies and candidates
    Recruitment,
    /// The signed-in employee's own record
    #[serde(rename = "My Info")]
    MyInfo,
    /// Reviews and KPIs
    Performance,
    /// Landing page after login
    Dashboard,
    /// Employee directory
    Directory,
    /// Expense claims
    Claim,
    /// Social feed
    Buzz,
}

impl Section {
    /// Every section in menu order
    pub const ALL: [Self; 11] = [
        Self::Admin,
        Self::Pim,
        Self::Leave,
        Self::Time,
        Self::Recruitment,
        Self::MyInfo,
        Self::Performance,
        Self::Dashboard,
        Self::Directory,
        Self::Claim,
        Self::Buzz,
    ];

    /// Label shown in the menu
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Pim => "PIM",
            Self::Leave => "Leave",
            Self::Time => "Time",
            Self::Recruitment => "Recruitment",
            Self::MyInfo => "My Info",
            Self::Performance => "Performance",
            Self::Dashboard => "Dashboard",
            Self::Directory => "Directory",
            Self::Claim => "Claim",
            Self::Buzz => "Buzz",
        }
    }

    /// Fragment of the menu link's `href`
    #[must_use]
    pub const fn href_fragment(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Pim => "pim",
            Self::Leave => "leave",
            Self::Time => "time",
            Self::Recruitment => "recruitment",
            Self::MyInfo => "viewMyDetails",
            Self::Performance => "performance",
            Self::Dashboard => "dashboard",
            Self::Directory => "directory",
            Self::Claim => "claim",
            Self::Buzz => "buzz",
        }
    }

    /// Menu entry locators, most specific first
    #[must_use]
    pub fn candidates(self) -> CandidateLocator {
        let name = self.display_name();
        let href = self.href_fragment();
        CandidateLocator::new(
            format!("{name} tab"),
            vec![
                Selector::xpath(format!("//span[normalize-space()='{name}']")),
                Selector::xpath(format!("//a[contains(@href,'{href}')]")),
                Selector::xpath(format!("//aside//span[normalize-space()='{name}']")),
                Selector::css(format!("a.oxd-main-menu-item[href*='{href}']")),
            ],
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Section {
    type Err = ProbeError;

    /// Case-insensitive; spaces, dashes and underscores are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let squash = |v: &str| -> String {
            v.chars()
                .filter(|c| !matches!(c, ' ' | '-' | '_'))
                .flat_map(char::to_lowercase)
                .collect()
        };
        let wanted = squash(s);
        Self::ALL
            .into_iter()
            .find(|section| squash(section.display_name()) == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|s| s.display_name()).collect();
                ProbeError::config(format!(
                    "unknown section '{s}' (known: {})",
                    known.join(", ")
                ))
            })
    }
}

// ============================================================================
// Navigation
// ============================================================================

/// Side menu plus the heading/breadcrumb it leads to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavBar {
    /// Where landing pages show their title
    pub target: ConfirmationTarget,
}

impl NavBar {
    /// Navigation bar with the stock confirmation target
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Click a section's menu entry
    ///
    /// # Errors
    ///
    /// `NotFound` or `ClickIntercepted`.
    pub fn open<D>(&self, driver: &D, section: Section, waiter: &Waiter) -> ProbeResult<()>
    where
        D: BrowserDriver + ?Sized,
    {
        info!(%section, "opening section");
        locate_and_click(driver, &section.candidates(), waiter).map(|_| ())
    }

    /// Confirm the landing page against `expected`
    ///
    /// # Errors
    ///
    /// `AssertionFailed` naming the first missing token.
    pub fn confirm<D>(&self, driver: &D, expected: &str, waiter: &Waiter) -> ProbeResult<()>
    where
        D: BrowserDriver + ?Sized,
    {
        confirm_tokens(driver, &self.target, expected, waiter)
    }
}
