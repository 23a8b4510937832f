use std::time::Duration;

/// Fixed delays inserted between input events.
///
/// These stand in for real completion signals, which the remote session does
/// not provide. A slow session can still drop or misplace input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After every single click.
    pub after_click: Duration,
    /// Between the two clicks of a double-click.
    pub double_click_interval: Duration,
    /// Between scroll-button clicks.
    pub scroll_interval: Duration,
    /// After each navigate step of a workflow.
    pub between_steps: Duration,
    /// Between keystrokes of the login sequence.
    pub keystroke: Duration,
    /// After bringing an application to the front.
    pub activation: Duration,
    /// Before and after pressing the mouse button in a drag.
    pub settle: Duration,
    /// Between the client processes appearing and the login keystrokes.
    pub login_settle: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_click: Duration::from_millis(300),
            double_click_interval: Duration::from_millis(100),
            scroll_interval: Duration::from_millis(200),
            between_steps: Duration::from_secs(1),
            keystroke: Duration::from_millis(200),
            activation: Duration::from_secs(1),
            settle: Duration::from_millis(500),
            login_settle: Duration::from_secs(8),
        }
    }
}

impl Pacing {
    /// No delays at all.
    pub fn none() -> Self {
        Self {
            after_click: Duration::ZERO,
            double_click_interval: Duration::ZERO,
            scroll_interval: Duration::ZERO,
            between_steps: Duration::ZERO,
            keystroke: Duration::ZERO,
            activation: Duration::ZERO,
            settle: Duration::ZERO,
            login_settle: Duration::ZERO,
        }
    }
}

/// `std::thread::sleep` that skips zero durations.
pub(crate) fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
