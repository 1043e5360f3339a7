//! Scenario orchestration.
//!
//! A scenario logs in with credentials from a fixture row, then walks a list
//! of navigation checks (open a section, confirm its heading/breadcrumb).
//! Progress is tracked as an explicit state machine:
//!
//! ```text
//! Init ──► LoggedIn ──► TabOpened ──► Confirmed ──► TornDown
//!                          ▲              │
//!                          └──────────────┘   (next check)
//!
//! any state ──► Failed ──► TornDown
//! ```
//!
//! The browser session is closed on every exit path: explicitly on the normal
//! path and by [`Session`]'s `Drop` on early return or panic. The hygiene
//! hook runs before and after every scenario regardless of outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SuiteConfig;
use crate::driver::BrowserDriver;
use crate::fixture::{Credentials, Row};
use crate::hygiene::{HygieneHook, NoopHygiene, ProcessHygiene};
use crate::page_object::{LoginPage, NavBar, Section};
use crate::reporter::{CheckOutcome, ScenarioOutcome, Status};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Waiter;

// ============================================================================
// State machine
// ============================================================================

/// Where a scenario is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioState {
    /// Nothing done yet
    Init,
    /// Dashboard confirmed after login
    LoggedIn,
    /// A section's menu entry was clicked
    TabOpened,
    /// The section's landing page was confirmed
    Confirmed,
    /// Session released
    TornDown,
    /// A step failed
    Failed,
}

impl ScenarioState {
    /// Whether `next` is a legal successor of this state
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::TornDown, _) => false,
            (_, Self::TornDown) => true,
            (Self::Failed, _) => false,
            (_, Self::Failed) => true,
            (Self::Init, Self::LoggedIn) => true,
            (Self::LoggedIn | Self::TabOpened | Self::Confirmed, Self::TabOpened) => true,
            (Self::TabOpened, Self::Confirmed) => true,
            _ => false,
        }
    }

    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::TornDown)
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ============================================================================
// Scenario definitions
// ============================================================================

/// Open a section and confirm its landing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationCheck {
    /// Section to open
    pub section: Section,
    /// `/`-separated tokens expected in heading + breadcrumb
    pub expect: String,
    /// Failure is recorded as a skip instead of failing the scenario
    pub optional: bool,
}

impl NavigationCheck {
    /// Required check
    #[must_use]
    pub fn new(section: Section, expect: impl Into<String>) -> Self {
        Self {
            section,
            expect: expect.into(),
            optional: false,
        }
    }

    /// Mark the check optional
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Every section with the landing text it must show
#[must_use]
pub fn default_tour() -> Vec<NavigationCheck> {
    vec![
        NavigationCheck::new(Section::Admin, "Admin/User Management"),
        NavigationCheck::new(Section::Pim, "PIM"),
        NavigationCheck::new(Section::Leave, "Leave"),
        NavigationCheck::new(Section::Time, "Time/Timesheets"),
        // Hidden for some roles
        NavigationCheck::new(Section::Recruitment, "Recruitment").optional(),
        NavigationCheck::new(Section::MyInfo, "PIM"),
        NavigationCheck::new(Section::Performance, "Performance/Manage Reviews"),
        NavigationCheck::new(Section::Dashboard, "Dashboard"),
        NavigationCheck::new(Section::Directory, "Directory"),
        NavigationCheck::new(Section::Claim, "Claim"),
        NavigationCheck::new(Section::Buzz, "Buzz"),
    ]
}

/// Login followed by zero or more navigation checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Name shown in reports
    pub name: String,
    /// Checks run after login, in order
    pub checks: Vec<NavigationCheck>,
}

impl Scenario {
    /// Login only
    #[must_use]
    pub fn login(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checks: Vec::new(),
        }
    }

    /// Login then the full section tour
    #[must_use]
    pub fn tour(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checks: default_tour(),
        }
    }

    /// Login then one section
    #[must_use]
    pub fn tab(section: Section, expect: impl Into<String>) -> Self {
        let expect = expect.into();
        Self {
            name: format!("Open {section} and expect '{expect}'"),
            checks: vec![NavigationCheck::new(section, expect)],
        }
    }

    /// Append a check
    #[must_use]
    pub fn with_check(mut self, check: NavigationCheck) -> Self {
        self.checks.push(check);
        self
    }
}

/// One login scenario per row that carries credentials
#[must_use]
pub fn login_matrix(rows: Vec<Row>) -> Vec<(Scenario, Row)> {
    rows.into_iter()
        .filter(Row::has_credentials)
        .map(|row| {
            let user = Credentials::from_row(&row)
                .map(|c| c.username)
                .unwrap_or_default();
            (Scenario::login(format!("Login with username: {user}")), row)
        })
        .collect()
}

// ============================================================================
// Session guard
// ============================================================================

/// Owns a driver and closes it exactly once
#[derive(Debug)]
pub struct Session<D: BrowserDriver> {
    driver: D,
    open: bool,
}

impl<D: BrowserDriver> Session<D> {
    /// Take ownership of an open driver
    #[must_use]
    pub const fn new(driver: D) -> Self {
        Self { driver, open: true }
    }

    /// Shared access to the driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Exclusive access to the driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Whether the session has not been closed yet
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Close the driver. Later calls are no-ops.
    ///
    /// # Errors
    ///
    /// Propagates the driver's close error on the first call.
    pub fn close(&mut self) -> ProbeResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.driver.close()
    }
}

impl<D: BrowserDriver> Drop for Session<D> {
    fn drop(&mut self) {
        if self.open {
            debug!("closing browser session on drop");
            if let Err(e) = self.close() {
                warn!(error = %e, "failed to close browser session");
            }
        }
    }
}

// Runs the hook when the scenario scope ends, including on panic.
struct CleanupOnExit<'a>(&'a dyn HygieneHook);

impl Drop for CleanupOnExit<'_> {
    fn drop(&mut self) {
        self.0.cleanup();
    }
}

// ============================================================================
// Context
// ============================================================================

/// Everything one scenario run works with
#[derive(Debug)]
pub struct ScenarioContext<'a, D: BrowserDriver> {
    session: &'a mut Session<D>,
    row: &'a Row,
    config: &'a SuiteConfig,
    waiter: Waiter,
    state: ScenarioState,
    checks: Vec<CheckOutcome>,
}

impl<'a, D: BrowserDriver> ScenarioContext<'a, D> {
    /// Fresh context in [`ScenarioState::Init`]
    #[must_use]
    pub fn new(session: &'a mut Session<D>, row: &'a Row, config: &'a SuiteConfig) -> Self {
        Self {
            session,
            row,
            config,
            waiter: Waiter::new(config.wait_options()),
            state: ScenarioState::Init,
            checks: Vec::new(),
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ScenarioState {
        self.state
    }

    /// Fixture row
    #[must_use]
    pub const fn row(&self) -> &Row {
        self.row
    }

    /// Check outcomes so far
    #[must_use]
    pub fn checks(&self) -> &[CheckOutcome] {
        &self.checks
    }

    fn driver(&self) -> &D {
        self.session.driver()
    }

    fn advance(&mut self, next: ScenarioState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    /// `Init -> LoggedIn`
    ///
    /// # Errors
    ///
    /// `MissingCredential`, `NotFound`, `ClickIntercepted` or
    /// `LoginNotConfirmed`.
    pub fn login(&mut self, page: &LoginPage) -> ProbeResult<()> {
        let credentials = Credentials::from_row(self.row)?;
        page.open(self.session.driver_mut(), &self.config.base_url)?;

        let driver = self.session.driver();
        page.login(driver, &credentials, &self.waiter)?;
        if !page.is_dashboard_displayed(driver, &self.waiter) {
            return Err(ProbeError::LoginNotConfirmed {
                url: driver.current_url().unwrap_or_default(),
            });
        }

        self.advance(ScenarioState::LoggedIn);
        Ok(())
    }

    /// `LoggedIn | Confirmed -> TabOpened`
    ///
    /// # Errors
    ///
    /// `NotFound` or `ClickIntercepted`.
    pub fn open_section(&mut self, nav: &NavBar, section: Section) -> ProbeResult<()> {
        nav.open(self.driver(), section, &self.waiter)?;
        self.advance(ScenarioState::TabOpened);
        Ok(())
    }

    /// `TabOpened -> Confirmed`
    ///
    /// # Errors
    ///
    /// `AssertionFailed`.
    pub fn confirm(&mut self, nav: &NavBar, expect: &str) -> ProbeResult<()> {
        nav.confirm(self.driver(), expect, &self.waiter)?;
        self.advance(ScenarioState::Confirmed);
        Ok(())
    }

    /// Open then confirm, recording the outcome
    ///
    /// # Errors
    ///
    /// The step error for a required check; optional checks never fail.
    pub fn run_check(&mut self, nav: &NavBar, check: &NavigationCheck) -> ProbeResult<()> {
        let started = Instant::now();
        let section = check.section.display_name();

        let result = match self.open_section(nav, check.section) {
            Ok(()) => self.confirm(nav, &check.expect),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.checks
                    .push(CheckOutcome::passed(section, &check.expect, started.elapsed()));
                Ok(())
            }
            Err(e) if check.optional => {
                warn!(section, error = %e, "optional check skipped");
                self.checks.push(CheckOutcome::skipped(
                    section,
                    &check.expect,
                    started.elapsed(),
                    e.to_string(),
                ));
                Ok(())
            }
            Err(e) => {
                self.checks.push(CheckOutcome::failed(
                    section,
                    &check.expect,
                    started.elapsed(),
                    e.to_string(),
                ));
                Err(e)
            }
        }
    }

    fn drive(&mut self, scenario: &Scenario, page: &LoginPage, nav: &NavBar) -> ProbeResult<()> {
        self.login(page)?;
        for check in &scenario.checks {
            self.run_check(nav, check)?;
        }
        Ok(())
    }

    fn into_checks(self) -> (ScenarioState, Vec<CheckOutcome>) {
        (self.state, self.checks)
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Runs scenarios one at a time
#[derive(Debug)]
pub struct ScenarioRunner {
    config: SuiteConfig,
    login: LoginPage,
    nav: NavBar,
    hygiene: Box<dyn HygieneHook>,
}

impl ScenarioRunner {
    /// Runner with stock pages; process cleanup follows `config.cleanup`
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        let hygiene: Box<dyn HygieneHook> = if config.cleanup {
            Box::new(ProcessHygiene::default())
        } else {
            Box::new(NoopHygiene)
        };
        Self {
            config,
            login: LoginPage::new(),
            nav: NavBar::new(),
            hygiene,
        }
    }

    /// Replace the hygiene hook
    #[must_use]
    pub fn with_hygiene(mut self, hook: impl HygieneHook + 'static) -> Self {
        self.hygiene = Box::new(hook);
        self
    }

    /// Replace the login page selectors
    #[must_use]
    pub fn with_login_page(mut self, page: LoginPage) -> Self {
        self.login = page;
        self
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run `scenario` on an already launched driver
    pub fn run<D: BrowserDriver>(&self, scenario: &Scenario, row: &Row, driver: D) -> ScenarioOutcome {
        self.run_with(scenario, row, || Ok(driver))
    }

    /// Clean up, launch a driver, run `scenario`, tear down, clean up.
    pub fn run_with<D, F>(&self, scenario: &Scenario, row: &Row, launch: F) -> ScenarioOutcome
    where
        D: BrowserDriver,
        F: FnOnce() -> ProbeResult<D>,
    {
        let started = Instant::now();
        info!(scenario = %scenario.name, checks = scenario.checks.len(), "scenario started");

        self.hygiene.cleanup();
        let _cleanup = CleanupOnExit(self.hygiene.as_ref());

        let mut session = match launch() {
            Ok(driver) => Session::new(driver),
            Err(e) => {
                warn!(scenario = %scenario.name, error = %e, "browser launch failed");
                return finish(scenario, Err(e), ScenarioState::Init, Vec::new(), started);
            }
        };

        let mut ctx = ScenarioContext::new(&mut session, row, &self.config);
        let result = ctx.drive(scenario, &self.login, &self.nav);
        let (reached, checks) = ctx.into_checks();

        if let Err(e) = session.close() {
            warn!(error = %e, "browser session close failed");
        }

        finish(scenario, result, reached, checks, started)
    }
}

fn finish(
    scenario: &Scenario,
    result: ProbeResult<()>,
    reached: ScenarioState,
    checks: Vec<CheckOutcome>,
    started: Instant,
) -> ScenarioOutcome {
    let duration_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(()) => {
            info!(scenario = %scenario.name, reached = %reached, duration_ms, "scenario passed");
            ScenarioOutcome {
                name: scenario.name.clone(),
                status: Status::Passed,
                final_state: ScenarioState::TornDown,
                error: None,
                checks,
                duration_ms,
            }
        }
        Err(e) => {
            warn!(scenario = %scenario.name, reached = %reached, error = %e, "scenario failed");
            ScenarioOutcome {
                name: scenario.name.clone(),
                status: Status::Failed,
                final_state: ScenarioState::Failed,
                error: Some(e.to_string()),
                checks,
                duration_ms,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::confirm::{BREADCRUMB_SELECTOR, HEADING_SELECTOR};
    use crate::driver::{MockDriver, MockEffect, MockElement};
    use crate::locator::Selector;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Default)]
    struct CountingHygiene(Rc<Cell<u32>>);

    impl HygieneHook for CountingHygiene {
        fn cleanup(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn config() -> SuiteConfig {
        SuiteConfig::new()
            .with_base_url("https://hrm.test/")
            .with_timeout_ms(20)
            .with_cleanup(false)
    }

    fn admin_row() -> Row {
        Row::from_pairs([("Username", "Admin"), ("Password", "admin123")])
    }

    fn menu_item(section: Section, heading: &str, breadcrumb: &str) -> MockElement {
        MockElement::new(Selector::xpath(format!(
            "//span[normalize-space()='{}']",
            section.display_name()
        )))
        .on_click(MockEffect::Reveal(
            MockElement::new(Selector::css(HEADING_SELECTOR)).with_text(heading),
        ))
        .on_click(MockEffect::Reveal(
            MockElement::new(Selector::css(BREADCRUMB_SELECTOR)).with_text(breadcrumb),
        ))
    }

    fn app() -> MockDriver {
        MockDriver::new()
            .with_element(MockElement::new(Selector::name("username")))
            .with_element(MockElement::new(Selector::name("password")))
            .with_element(
                MockElement::new(Selector::css("button[type='submit']"))
                    .on_click(MockEffect::Navigate(
                        "https://hrm.test/web/index.php/dashboard/index".to_string(),
                    ))
                    .on_click(MockEffect::Reveal(
                        MockElement::new(Selector::css(HEADING_SELECTOR)).with_text("Dashboard"),
                    )),
            )
            .with_element(menu_item(Section::Pim, "PIM", "Employee Information"))
            .with_element(menu_item(Section::Leave, "Leave", "Leave List"))
    }

    mod state_tests {
        use super::*;

        #[test]
        fn test_forward_path() {
            use ScenarioState::*;
            assert!(Init.can_transition_to(LoggedIn));
            assert!(LoggedIn.can_transition_to(TabOpened));
            assert!(TabOpened.can_transition_to(Confirmed));
            assert!(Confirmed.can_transition_to(TabOpened));
            assert!(Confirmed.can_transition_to(TornDown));
        }

        #[test]
        fn test_illegal_transitions() {
            use ScenarioState::*;
            assert!(!Init.can_transition_to(TabOpened));
            assert!(!LoggedIn.can_transition_to(Confirmed));
            assert!(!Failed.can_transition_to(LoggedIn));
            assert!(!TornDown.can_transition_to(Init));
            assert!(Failed.can_transition_to(TornDown));
            assert!(TornDown.is_terminal());
        }
    }

    mod session_tests {
        use super::*;

        #[test]
        fn test_drop_closes() {
            let mut driver = MockDriver::new();
            {
                let _session = Session::new(&mut driver);
            }
            assert!(driver.is_closed());
        }

        #[test]
        fn test_close_once() {
            let mut driver = MockDriver::new();
            {
                let mut session = Session::new(&mut driver);
                session.close().unwrap();
                session.close().unwrap();
                assert!(!session.is_open());
            }
            assert_eq!(driver.history().iter().filter(|c| *c == "close").count(), 1);
        }
    }

    mod runner_tests {
        use super::*;

        #[test]
        fn test_login_scenario_passes() {
            let mut driver = app();
            let runner = ScenarioRunner::new(config());
            let outcome = runner.run(&Scenario::login("admin"), &admin_row(), &mut driver);

            assert!(outcome.passed(), "{:?}", outcome.error);
            assert_eq!(outcome.final_state, ScenarioState::TornDown);
            assert!(driver.was_called("navigate:https://hrm.test/"));
            assert!(driver.is_closed());
        }

        #[test]
        fn test_tab_check_recorded() {
            let mut driver = app();
            let runner = ScenarioRunner::new(config());
            let outcome = runner.run(
                &Scenario::tab(Section::Pim, "PIM/Employee Information"),
                &admin_row(),
                &mut driver,
            );
            assert!(outcome.passed(), "{:?}", outcome.error);
            assert_eq!(outcome.checks.len(), 1);
            assert_eq!(outcome.checks[0].section, "PIM");
        }

        #[test]
        fn test_missing_credentials_fail_before_navigation() {
            let mut driver = app();
            let hygiene = CountingHygiene::default();
            let runner = ScenarioRunner::new(config()).with_hygiene(hygiene.clone());
            let row = Row::from_pairs([("Email", "admin@hrm.test")]);
            let outcome = runner.run(&Scenario::login("no creds"), &row, &mut driver);

            assert_eq!(outcome.status, Status::Failed);
            assert!(outcome.error.unwrap().contains("None of the keys"));
            assert!(!driver.was_called("navigate:"));
            assert!(driver.is_closed());
            assert_eq!(hygiene.0.get(), 2);
        }

        #[test]
        fn test_login_not_confirmed_reports_url() {
            let mut driver = MockDriver::new()
                .with_element(MockElement::new(Selector::name("username")))
                .with_element(MockElement::new(Selector::name("password")))
                .with_element(MockElement::new(Selector::css("button[type='submit']")));
            let runner = ScenarioRunner::new(config());
            let outcome = runner.run(&Scenario::login("bad"), &admin_row(), &mut driver);

            assert_eq!(outcome.final_state, ScenarioState::Failed);
            assert!(outcome.error.unwrap().contains("current url: https://hrm.test/"));
        }

        #[test]
        fn test_optional_check_skipped() {
            let mut driver = app();
            let scenario = Scenario::login("optional")
                .with_check(NavigationCheck::new(Section::Recruitment, "Recruitment").optional())
                .with_check(NavigationCheck::new(Section::Leave, "Leave"));
            let outcome = ScenarioRunner::new(config()).run(&scenario, &admin_row(), &mut driver);

            assert!(outcome.passed(), "{:?}", outcome.error);
            assert_eq!(outcome.checks_with(Status::Skipped), 1);
            assert_eq!(outcome.checks_with(Status::Passed), 1);
        }

        #[test]
        fn test_required_failure_stops_scenario() {
            let mut driver = app();
            let scenario = Scenario::login("stops")
                .with_check(NavigationCheck::new(Section::Leave, "Leave/Employee List"))
                .with_check(NavigationCheck::new(Section::Pim, "PIM"));
            let outcome = ScenarioRunner::new(config()).run(&scenario, &admin_row(), &mut driver);

            assert_eq!(outcome.status, Status::Failed);
            assert_eq!(outcome.checks.len(), 1);
            assert!(outcome.error.unwrap().contains("Employee List"));
            assert_eq!(
                driver.query_count(&Selector::xpath("//span[normalize-space()='PIM']")),
                0
            );
        }

        #[test]
        fn test_launch_failure_still_cleans_up() {
            let hygiene = CountingHygiene::default();
            let runner = ScenarioRunner::new(config()).with_hygiene(hygiene.clone());
            let outcome = runner.run_with(&Scenario::login("no browser"), &admin_row(), || {
                Err::<MockDriver, _>(ProbeError::BrowserLaunchError {
                    message: "chromium missing".to_string(),
                })
            });

            assert_eq!(outcome.status, Status::Failed);
            assert!(outcome.error.unwrap().contains("chromium missing"));
            assert_eq!(hygiene.0.get(), 2);
        }
    }

    mod definition_tests {
        use super::*;

        #[test]
        fn test_default_tour() {
            let tour = default_tour();
            assert_eq!(tour.len(), 11);
            assert_eq!(tour[0].expect, "Admin/User Management");
            let optional: Vec<_> = tour.iter().filter(|c| c.optional).collect();
            assert_eq!(optional.len(), 1);
            assert_eq!(optional[0].section, Section::Recruitment);
            let my_info = tour.iter().find(|c| c.section == Section::MyInfo).unwrap();
            assert_eq!(my_info.expect, "PIM");
        }

        #[test]
        fn test_login_matrix_filters_rows() {
            let rows = vec![
                admin_row(),
                Row::from_pairs([("Username", "ghost"), ("Password", "")]),
                Row::from_pairs([("user_name", "x")]),
            ];
            let matrix = login_matrix(rows);
            assert_eq!(matrix.len(), 1);
            assert_eq!(matrix[0].0.name, "Login with username: Admin");
        }

        #[test]
        fn test_tab_scenario_name() {
            let scenario = Scenario::tab(Section::MyInfo, "PIM");
            assert_eq!(scenario.name, "Open My Info and expect 'PIM'");
        }
    }
}
