//! macOS engine: `cliclick` for the mouse when installed, System Events
//! AppleScript for keyboard, process and window queries.

use super::script::{applescript_quote, parse_bounds, run_command};
use super::{input, AutomationEngine, Key, WindowBounds};
use crate::AutomationError;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, instrument, warn};

const CLICLICK_PATH: &str = "/opt/homebrew/bin/cliclick";

pub struct MacOSEngine {
    cliclick: Option<PathBuf>,
}

impl MacOSEngine {
    pub fn new() -> Self {
        let cliclick = Path::new(CLICLICK_PATH);
        Self {
            cliclick: cliclick.exists().then(|| cliclick.to_path_buf()),
        }
    }

    pub fn uses_cliclick(&self) -> bool {
        self.cliclick.is_some()
    }

    /// Run one `cliclick` command such as `c:100,200`. Returns `None` when
    /// `cliclick` is not installed.
    fn cliclick(&self, command: &str) -> Option<Result<(), AutomationError>> {
        let path = self.cliclick.as_ref()?;
        Some(run_command(Command::new(path).arg(command)).map(|_| ()))
    }

    fn osascript(&self, script: &str) -> Result<String, AutomationError> {
        run_command(Command::new("osascript").args(["-e", script]))
    }

    fn system_events(&self, body: &str) -> Result<String, AutomationError> {
        self.osascript(&format!(
            "tell application \"System Events\"\n{body}\nend tell"
        ))
    }
}

impl Default for MacOSEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn key_code(key: Key) -> u8 {
    match key {
        Key::Tab => 48,
        Key::Return => 36,
    }
}

impl AutomationEngine for MacOSEngine {
    fn platform(&self) -> &'static str {
        "macos"
    }

    #[instrument(level = "debug", skip(self))]
    fn click(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.cliclick(&format!("c:{x},{y}"))
            .unwrap_or_else(|| input::click(x, y))
    }

    fn move_mouse(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.cliclick(&format!("m:{x},{y}"))
            .unwrap_or_else(|| input::move_mouse(x, y))
    }

    fn mouse_down(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.cliclick(&format!("dd:{x},{y}"))
            .unwrap_or_else(|| input::mouse_down(x, y))
    }

    fn mouse_up(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.cliclick(&format!("du:{x},{y}"))
            .unwrap_or_else(|| input::mouse_up(x, y))
    }

    fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.system_events(&format!("keystroke {}", applescript_quote(text)))
            .map(|_| ())
    }

    fn press_key(&self, key: Key) -> Result<(), AutomationError> {
        self.system_events(&format!("key code {}", key_code(key)))
            .map(|_| ())
    }

    fn is_process_running(&self, name: &str) -> Result<bool, AutomationError> {
        let count = self.system_events(&format!(
            "count processes whose name is {}",
            applescript_quote(name)
        ))?;
        let count: u32 = count.parse().map_err(|e| {
            AutomationError::PlatformError(format!("Unexpected process count '{count}': {e}"))
        })?;
        debug!(process = name, count, "Process check");
        Ok(count > 0)
    }

    #[instrument(level = "debug", skip(self))]
    fn activate_application(&self, name: &str) -> Result<(), AutomationError> {
        self.system_events(&format!(
            "set frontmost of process {} to true",
            applescript_quote(name)
        ))
        .map(|_| ())
    }

    fn window_bounds(&self, app_name: &str) -> Result<WindowBounds, AutomationError> {
        let output = self.system_events(&format!(
            r#"tell process {}
    set frontWindow to first window
    set {{wx, wy}} to position of frontWindow
    set {{ww, wh}} to size of frontWindow
    return (wx as text) & "," & (wy as text) & "," & (ww as text) & "," & (wh as text)
end tell"#,
            applescript_quote(app_name)
        ))?;
        parse_bounds(&output)
    }

    #[instrument(skip(self))]
    fn quit_application(&self, app_name: &str) -> Result<(), AutomationError> {
        let app = applescript_quote(app_name);
        let sign_out = applescript_quote(&format!("Sign Out and Quit {app_name}"));
        let quit = applescript_quote(&format!("Quit {app_name}..."));
        let script = format!(
            r#"tell application {app} to activate
delay 0.5
tell application "System Events"
    tell process {app}
        click menu bar item 2 of menu bar 1
        delay 0.3
        try
            click menu item {sign_out} of menu 1 of menu bar item 2 of menu bar 1
            return "sign-out"
        on error
            click menu item {quit} of menu 1 of menu bar item 2 of menu bar 1
            delay 1
            click button "Sign Out" of window 1
            return "quit-dialog"
        end try
    end tell
end tell"#
        );

        match self.osascript(&script) {
            Ok(path) => {
                info!(method = %path, "Quit {} through its menu", app_name);
                Ok(())
            }
            Err(e) => {
                warn!("Menu quit of {} failed: {}", app_name, e);
                Err(e)
            }
        }
    }

    fn open_path(&self, target: &str) -> Result<(), AutomationError> {
        run_command(Command::new("open").arg(target)).map(|_| ())
    }
}
