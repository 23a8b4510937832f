use super::{AutomationEngine, Key, WindowBounds};
use crate::{AutomationError, ScreenshotResult};

/// Engine for platforms without an input-injection backend. Every call fails
/// with [`AutomationError::UnsupportedPlatform`].
#[derive(Debug, Clone)]
pub struct UnsupportedEngine {
    platform: String,
}

impl UnsupportedEngine {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }

    fn unsupported<T>(&self, operation: &str) -> Result<T, AutomationError> {
        Err(AutomationError::UnsupportedPlatform(format!(
            "{operation} is not supported on {}",
            self.platform
        )))
    }
}

impl AutomationEngine for UnsupportedEngine {
    fn platform(&self) -> &'static str {
        "unsupported"
    }

    fn click(&self, _x: i32, _y: i32) -> Result<(), AutomationError> {
        self.unsupported("click")
    }

    fn move_mouse(&self, _x: i32, _y: i32) -> Result<(), AutomationError> {
        self.unsupported("mouse move")
    }

    fn mouse_down(&self, _x: i32, _y: i32) -> Result<(), AutomationError> {
        self.unsupported("mouse down")
    }

    fn mouse_up(&self, _x: i32, _y: i32) -> Result<(), AutomationError> {
        self.unsupported("mouse up")
    }

    fn type_text(&self, _text: &str) -> Result<(), AutomationError> {
        self.unsupported("typing")
    }

    fn press_key(&self, _key: Key) -> Result<(), AutomationError> {
        self.unsupported("key press")
    }

    fn is_process_running(&self, _name: &str) -> Result<bool, AutomationError> {
        self.unsupported("process detection")
    }

    fn activate_application(&self, _name: &str) -> Result<(), AutomationError> {
        self.unsupported("application activation")
    }

    fn window_bounds(&self, _app_name: &str) -> Result<WindowBounds, AutomationError> {
        self.unsupported("window bounds")
    }

    fn quit_application(&self, _app_name: &str) -> Result<(), AutomationError> {
        self.unsupported("quitting applications")
    }

    fn open_path(&self, _target: &str) -> Result<(), AutomationError> {
        self.unsupported("opening files")
    }

    fn capture_screen(&self) -> Result<ScreenshotResult, AutomationError> {
        self.unsupported("screen capture")
    }
}
