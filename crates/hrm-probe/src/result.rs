//! Result and error types for hrm-probe.

use thiserror::Error;

/// Result type for hrm-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum ProbeError {
    /// None of the candidate selectors resolved in time
    #[error("{target} not found using known selectors: [{}]", .tried.join(", "))]
    NotFound {
        /// Logical name of the UI target
        target: String,
        /// Every selector that was probed, in order
        tried: Vec<String>,
    },

    /// Native click and scripted click both failed
    #[error("Click on {target} intercepted: native click failed ({native}), scripted click failed ({scripted})")]
    ClickIntercepted {
        /// Description of the clicked element
        target: String,
        /// Native click failure
        native: String,
        /// Scripted click failure
        scripted: String,
    },

    /// Expected token absent from the confirmation text
    #[error("Expected token not found in header/breadcrumb: {token} Actual: {actual}")]
    AssertionFailed {
        /// The token that was not found
        token: String,
        /// The combined heading + breadcrumb text that was observed
        actual: String,
    },

    /// No alias for a required column resolved in the fixture row
    #[error("None of the keys [{}] found in test data: [{}]", .keys.join(", "), .available.join(", "))]
    MissingCredential {
        /// Aliases that were tried
        keys: Vec<String>,
        /// Columns present in the row
        available: Vec<String>,
    },

    /// Dashboard marker never became visible after login
    #[error("Dashboard should be displayed after login (current url: {url})")]
    LoginNotConfirmed {
        /// URL observed after the login attempt
        url: String,
    },

    /// Requested sheet is absent from the workbook
    #[error("Sheet '{sheet}' not found (available: [{}])", .available.join(", "))]
    SheetNotFound {
        /// Requested sheet name
        sheet: String,
        /// Sheets present in the workbook
        available: Vec<String>,
    },

    /// Requested row is absent from the sheet
    #[error("Row not found at index {row} in sheet '{sheet}'")]
    RowNotFound {
        /// Sheet name
        sheet: String,
        /// Zero-based row index
        row: usize,
    },

    /// Workbook could not be opened or a sheet could not be read
    #[error("Error reading spreadsheet data: {message}")]
    CellRead {
        /// Error message
        message: String,
    },

    /// Driver-level failure (query, click, script, text read)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error comes from fixture data rather than the browser
    #[must_use]
    pub const fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. }
                | Self::SheetNotFound { .. }
                | Self::RowNotFound { .. }
                | Self::CellRead { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_message_names_token_and_actual() {
        let err = ProbeError::AssertionFailed {
            token: "Employee List".to_string(),
            actual: "Leave Leave".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Employee List"));
        assert!(msg.contains("Actual: Leave Leave"));
    }

    #[test]
    fn test_not_found_lists_selectors() {
        let err = ProbeError::NotFound {
            target: "Leave tab".to_string(),
            tried: vec!["xpath://a".to_string(), "css:a.menu".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Leave tab not found using known selectors: [xpath://a, css:a.menu]"
        );
    }

    #[test]
    fn test_missing_credential_message() {
        let err = ProbeError::MissingCredential {
            keys: vec!["Username".to_string(), "USER_NAME".to_string()],
            available: vec!["Email".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Username, USER_NAME"));
        assert!(msg.contains("[Email]"));
    }

    #[test]
    fn test_data_error_classification() {
        assert!(ProbeError::RowNotFound {
            sheet: "Sheet1".to_string(),
            row: 4
        }
        .is_data_error());
        assert!(!ProbeError::driver("boom").is_data_error());
        assert!(!ProbeError::LoginNotConfirmed {
            url: String::new()
        }
        .is_data_error());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ProbeError = io.into();
        assert!(matches!(err, ProbeError::Io(_)));
    }
}
