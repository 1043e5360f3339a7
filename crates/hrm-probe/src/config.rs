//! Suite configuration.
//!
//! Loaded from an optional YAML file; every field has a default so a file
//! only needs the keys it changes. Command-line flags are applied on top
//! through the `with_*` setters.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::driver::DriverConfig;
use crate::page_object::DEFAULT_BASE_URL;
use crate::result::{ProbeError, ProbeResult};
use crate::sheet::DEFAULT_SHEET;
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Configuration for a suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Application entry URL
    pub base_url: String,
    /// Fixture workbook
    pub fixture: PathBuf,
    /// Sheet holding the fixture rows
    pub sheet: String,
    /// Data row for single-row scenarios (row 0 is the header).
    /// `None` picks the first row that carries credentials.
    pub row: Option<usize>,
    /// Wait timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Run the browser without a window
    pub headless: bool,
    /// Kill stray processes around each scenario
    pub cleanup: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Chromium executable override
    pub chromium_path: Option<PathBuf>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            fixture: PathBuf::from("testdata/TestData.xlsx"),
            sheet: DEFAULT_SHEET.to_string(),
            row: None,
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            headless: true,
            cleanup: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chromium_path: None,
        }
    }
}

impl SuiteConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML text
    ///
    /// # Errors
    ///
    /// Returns `Yaml` for malformed input, `Config` for invalid values.
    pub fn from_yaml(text: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be read, otherwise as [`Self::from_yaml`].
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Render as YAML
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject values no run can use
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] naming the offending field.
    pub fn validate(&self) -> ProbeResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ProbeError::config("base_url must not be empty"));
        }
        if self.row == Some(0) {
            return Err(ProbeError::config("row must be >= 1 (row 0 is the header)"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ProbeError::config("poll_interval_ms must be positive"));
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(ProbeError::config("viewport must be non-zero"));
        }
        Ok(())
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set fixture path
    #[must_use]
    pub fn with_fixture(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixture = path.into();
        self
    }

    /// Set sheet name
    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = sheet.into();
        self
    }

    /// Set data row
    #[must_use]
    pub const fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Set wait timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Enable or disable process cleanup
    #[must_use]
    pub const fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Set chromium executable
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Wait options for locators and confirmation
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Browser launch settings
    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        let config = DriverConfig::new()
            .headless(self.headless)
            .viewport(self.viewport_width, self.viewport_height)
            .navigation_timeout(Duration::from_millis(self.timeout_ms.max(30_000)));
        match &self.chromium_path {
            Some(path) => config.executable_path(path.to_string_lossy()),
            None => config,
        }
    }
}
