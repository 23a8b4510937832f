use super::script::run_command;
use super::{input, AutomationEngine, Key, WindowBounds};
use crate::AutomationError;
use std::process::Command;
use sysinfo::{ProcessesToUpdate, System};

/// Linux engine: `enigo` for input, `sysinfo` for process checks and
/// `xdg-open` for files. Window management is not available.
pub struct LinuxEngine;

impl LinuxEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinuxEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationEngine for LinuxEngine {
    fn platform(&self) -> &'static str {
        "linux"
    }

    fn click(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        input::click(x, y)
    }

    fn move_mouse(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        input::move_mouse(x, y)
    }

    fn mouse_down(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        input::mouse_down(x, y)
    }

    fn mouse_up(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        input::mouse_up(x, y)
    }

    fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        input::type_text(text)
    }

    fn press_key(&self, key: Key) -> Result<(), AutomationError> {
        input::press_key(key)
    }

    fn is_process_running(&self, name: &str) -> Result<bool, AutomationError> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);
        let wanted = name.to_lowercase();
        Ok(system
            .processes()
            .values()
            .any(|p| p.name().to_string_lossy().to_lowercase() == wanted))
    }

    fn activate_application(&self, name: &str) -> Result<(), AutomationError> {
        Err(AutomationError::UnsupportedOperation(format!(
            "Activating {name} is not supported on Linux"
        )))
    }

    fn window_bounds(&self, app_name: &str) -> Result<WindowBounds, AutomationError> {
        Err(AutomationError::UnsupportedOperation(format!(
            "Reading the window bounds of {app_name} is not supported on Linux"
        )))
    }

    fn quit_application(&self, app_name: &str) -> Result<(), AutomationError> {
        Err(AutomationError::UnsupportedOperation(format!(
            "Signing out of {app_name} is not supported on Linux"
        )))
    }

    fn open_path(&self, target: &str) -> Result<(), AutomationError> {
        run_command(Command::new("xdg-open").arg(target)).map(|_| ())
    }
}
