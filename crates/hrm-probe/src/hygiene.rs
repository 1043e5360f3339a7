//! Process hygiene around scenarios.
//!
//! Stray browsers, drivers or a spreadsheet app holding the fixture open make
//! the next scenario flaky. The orchestrator calls [`HygieneHook::cleanup`]
//! before and after every scenario; implementations never fail.

use std::fmt;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a single kill command may run
pub const KILL_TIMEOUT: Duration = Duration::from_secs(5);

/// Best-effort environment cleanup
pub trait HygieneHook: fmt::Debug {
    /// Clean up. Must be idempotent and swallow its own errors.
    fn cleanup(&self);
}

/// Does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHygiene;

impl HygieneHook for NoopHygiene {
    fn cleanup(&self) {}
}

/// Kills stray processes by name
#[derive(Debug, Clone)]
pub struct ProcessHygiene {
    targets: Vec<String>,
    timeout: Duration,
}

impl Default for ProcessHygiene {
    fn default() -> Self {
        let targets: &[&str] = if cfg!(windows) {
            &["EXCEL.EXE", "chrome.exe", "chromedriver.exe"]
        } else {
            &["Excel", "chrome", "chromedriver"]
        };
        Self::new(targets.iter().map(|t| (*t).to_string()).collect())
    }
}

impl ProcessHygiene {
    /// Kill the given process names
    #[must_use]
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            timeout: KILL_TIMEOUT,
        }
    }

    /// Override the per-command timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Process names this hook kills
    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    fn kill_command(target: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("taskkill");
            cmd.args(["/F", "/T", "/IM", target]);
            cmd
        } else {
            let mut cmd = Command::new("pkill");
            cmd.args(["-f", target]);
            cmd
        }
    }

    fn kill(&self, target: &str) {
        let spawned = Self::kill_command(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                debug!(target_process = target, error = %e, "kill command unavailable");
                return;
            }
        };

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(target_process = target, ?status, "kill command finished");
                    return;
                }
                Ok(None) if start.elapsed() < self.timeout => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                Ok(None) => {
                    warn!(target_process = target, "kill command timed out");
                    let _ = child.kill();
                    let _ = child.wait();
                    return;
                }
                Err(e) => {
                    debug!(target_process = target, error = %e, "kill command wait failed");
                    return;
                }
            }
        }
    }
}

impl HygieneHook for ProcessHygiene {
    fn cleanup(&self) {
        for target in &self.targets {
            self.kill(target);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets() {
        let hygiene = ProcessHygiene::default();
        assert_eq!(hygiene.targets().len(), 3);
        assert!(hygiene
            .targets()
            .iter()
            .any(|t| t.to_lowercase().starts_with("chromedriver")));
    }

    #[test]
    fn test_noop_is_silent() {
        NoopHygiene.cleanup();
        NoopHygiene.cleanup();
    }

    #[test]
    fn test_unmatched_target_does_not_fail() {
        // A name no process carries; pkill exits 1, which must be swallowed.
        let hygiene = ProcessHygiene::new(vec!["hrm-probe-no-such-process-7f3a".to_string()])
            .with_timeout(Duration::from_secs(2));
        hygiene.cleanup();
        hygiene.cleanup();
    }
}
