use super::script::{powershell_quote, run_command, sendkeys_escape};
use super::{input, AutomationEngine, Key, WindowBounds};
use crate::AutomationError;
use std::process::Command;
use tracing::{debug, instrument};

/// Windows engine: `enigo` for the mouse, PowerShell for keystrokes,
/// activation and opening files, `tasklist` for process checks.
pub struct WindowsEngine;

impl WindowsEngine {
    pub fn new() -> Self {
        Self
    }

    fn powershell(&self, script: &str) -> Result<String, AutomationError> {
        run_command(Command::new("powershell").args([
            "-NoProfile",
            "-WindowStyle",
            "hidden",
            "-Command",
            script,
        ]))
    }

    fn send_keys(&self, keys: &str) -> Result<(), AutomationError> {
        let script = format!(
            "Add-Type -AssemblyName System.Windows.Forms; [System.Windows.Forms.SendKeys]::SendWait({})",
            powershell_quote(keys)
        );
        self.powershell(&script).map(|_| ())
    }
}

impl Default for WindowsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationEngine for WindowsEngine {
    fn platform(&self) -> &'static str {
        "windows"
    }

    #[instrument(level = "debug", skip(self))]
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
        self.send_keys(&sendkeys_escape(text))
    }

    fn press_key(&self, key: Key) -> Result<(), AutomationError> {
        let keys = match key {
            Key::Tab => "{TAB}",
            Key::Return => "{ENTER}",
        };
        self.send_keys(keys)
    }

    fn is_process_running(&self, name: &str) -> Result<bool, AutomationError> {
        let image = if name.to_lowercase().ends_with(".exe") {
            name.to_string()
        } else {
            format!("{name}.exe")
        };
        let output = run_command(Command::new("tasklist").args([
            "/FI",
            &format!("IMAGENAME eq {image}"),
            "/NH",
        ]))?;
        debug!(process = %image, "tasklist: {}", output);
        Ok(!output.is_empty() && !output.contains("No tasks"))
    }

    fn activate_application(&self, name: &str) -> Result<(), AutomationError> {
        let script = format!(
            "$shell = New-Object -ComObject WScript.Shell; if (-not $shell.AppActivate({})) {{ exit 1 }}",
            powershell_quote(name)
        );
        self.powershell(&script).map(|_| ())
    }

    fn window_bounds(&self, app_name: &str) -> Result<WindowBounds, AutomationError> {
        Err(AutomationError::UnsupportedOperation(format!(
            "Reading the window bounds of {app_name} is not supported on Windows"
        )))
    }

    fn quit_application(&self, app_name: &str) -> Result<(), AutomationError> {
        Err(AutomationError::UnsupportedOperation(format!(
            "Signing out of {app_name} is not supported on Windows"
        )))
    }

    fn open_path(&self, target: &str) -> Result<(), AutomationError> {
        self.powershell(&format!("Start-Process {}", powershell_quote(target)))
            .map(|_| ())
    }
}
