use crate::{AutomationError, ScreenshotResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod input;
pub mod script;
pub mod unsupported;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "windows")]
pub mod windows;

pub use unsupported::UnsupportedEngine;

/// Keys sent by the session scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Return,
}

/// Position and size of a window, in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// The input, process and capture capabilities every platform provides.
///
/// All calls block until the underlying tool returns. Implementations that
/// cannot perform an operation return [`AutomationError::UnsupportedOperation`]
/// or [`AutomationError::UnsupportedPlatform`].
pub trait AutomationEngine: Send + Sync {
    /// Short platform name, for logs.
    fn platform(&self) -> &'static str;

    /// Left click at absolute screen coordinates.
    fn click(&self, x: i32, y: i32) -> Result<(), AutomationError>;

    /// Two left clicks `interval` apart.
    fn double_click(&self, x: i32, y: i32, interval: Duration) -> Result<(), AutomationError> {
        self.click(x, y)?;
        crate::pacing::pause(interval);
        self.click(x, y)
    }

    fn move_mouse(&self, x: i32, y: i32) -> Result<(), AutomationError>;

    /// Press and hold the left button at the given position.
    fn mouse_down(&self, x: i32, y: i32) -> Result<(), AutomationError>;

    /// Release the left button at the given position.
    fn mouse_up(&self, x: i32, y: i32) -> Result<(), AutomationError>;

    /// Type text into whatever has keyboard focus.
    fn type_text(&self, text: &str) -> Result<(), AutomationError>;

    fn press_key(&self, key: Key) -> Result<(), AutomationError>;

    /// Whether a process with this name is currently running.
    fn is_process_running(&self, name: &str) -> Result<bool, AutomationError>;

    /// Bring an application or process to the front.
    fn activate_application(&self, name: &str) -> Result<(), AutomationError>;

    /// Bounds of the front window of an application.
    fn window_bounds(&self, app_name: &str) -> Result<WindowBounds, AutomationError>;

    /// Sign out of and quit the remote-desktop client through its menu.
    fn quit_application(&self, app_name: &str) -> Result<(), AutomationError>;

    /// Open a file or URL with the system default handler.
    fn open_path(&self, target: &str) -> Result<(), AutomationError>;

    /// Screenshot of the primary monitor.
    fn capture_screen(&self) -> Result<ScreenshotResult, AutomationError> {
        crate::capture::capture_primary_monitor()
    }
}

/// Create the engine for the current platform
pub fn create_engine() -> Arc<dyn AutomationEngine> {
    #[cfg(target_os = "macos")]
    {
        let engine = macos::MacOSEngine::new();
        info!(cliclick = engine.uses_cliclick(), "Using macOS automation engine");
        Arc::new(engine)
    }
    #[cfg(target_os = "windows")]
    {
        info!("Using Windows automation engine");
        Arc::new(windows::WindowsEngine::new())
    }
    #[cfg(target_os = "linux")]
    {
        info!("Using Linux automation engine");
        Arc::new(linux::LinuxEngine::new())
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        info!("No automation engine for {}", std::env::consts::OS);
        Arc::new(UnsupportedEngine::new(std::env::consts::OS))
    }
}
