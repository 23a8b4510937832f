//! Polling for external applications before a session script runs.

use crate::pacing::pause;
use crate::platforms::AutomationEngine;
use crate::AutomationError;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often, and how many times, to check a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// Total number of checks, including the first.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 40,
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// `attempts` checks with no wait between them.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(Duration::ZERO, attempts)
    }
}

/// Evaluate `check` until it returns true or the attempts run out.
///
/// Returns whether the condition was met and how many checks were made.
pub fn poll_until(poll: PollConfig, mut check: impl FnMut(u32) -> bool) -> (bool, u32) {
    let max_attempts = poll.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        if check(attempt) {
            return (true, attempt);
        }
        if attempt >= max_attempts {
            return (false, attempt);
        }
        debug!(
            "Attempt {}/{}: condition not met, checking again in {:?}",
            attempt, max_attempts, poll.interval
        );
        pause(poll.interval);
        attempt += 1;
    }
}

/// Wait until every named process is running.
///
/// A detection error counts as "not running" for that check.
pub fn wait_for_apps(
    engine: &dyn AutomationEngine,
    app_names: &[&str],
    poll: PollConfig,
) -> Result<(), AutomationError> {
    info!(
        "Waiting for applications to be running: {}",
        app_names.join(", ")
    );

    let (all_running, attempts) = poll_until(poll, |_| {
        let mut all_running = true;
        for app in app_names {
            let running = match engine.is_process_running(app) {
                Ok(running) => running,
                Err(e) => {
                    warn!("Error checking if {} is running: {}", app, e);
                    false
                }
            };
            debug!("{}: {}", app, if running { "Running" } else { "Not running" });
            all_running &= running;
        }
        all_running
    });

    if !all_running {
        return Err(AutomationError::Timeout(format!(
            "Timed out waiting for applications to launch: {}",
            app_names.join(", ")
        )));
    }

    info!(attempts, "All required applications are now running");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_stops_on_first_success() {
        let (met, attempts) = poll_until(PollConfig::immediate(10), |attempt| attempt == 3);
        assert!(met);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn poll_gives_up_after_max_attempts() {
        let mut calls = 0;
        let (met, attempts) = poll_until(PollConfig::immediate(4), |_| {
            calls += 1;
            false
        });
        assert!(!met);
        assert_eq!(attempts, 4);
        assert_eq!(calls, 4);
    }

    #[test]
    fn zero_attempts_still_checks_once() {
        let (met, attempts) = poll_until(PollConfig::immediate(0), |_| true);
        assert!(met);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn default_budget_is_forty_one_second_checks() {
        let poll = PollConfig::default();
        assert_eq!(poll.interval, Duration::from_secs(1));
        assert_eq!(poll.max_attempts, 40);
    }
}
