//! Helpers for driving external tools (`osascript`, `cliclick`, PowerShell).

use super::WindowBounds;
use crate::AutomationError;
use std::process::Command;
use tracing::{debug, error};

/// Run a command to completion and return its trimmed stdout.
///
/// A non-zero exit status is an error carrying stderr.
pub fn run_command(command: &mut Command) -> Result<String, AutomationError> {
    debug!("Running {:?}", command);
    let output = command.output().map_err(|e| {
        AutomationError::PlatformError(format!("Failed to run {:?}: {e}", command.get_program()))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(
            "{:?} exited with {:?}: {}",
            command.get_program(),
            output.status.code(),
            stderr.trim()
        );
        return Err(AutomationError::PlatformError(format!(
            "{:?} failed: {}",
            command.get_program(),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Quote a value as an AppleScript string literal.
pub fn applescript_quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Quote a value as a single-quoted PowerShell string literal.
pub fn powershell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Escape text for `System.Windows.Forms.SendKeys`, where `+^%~(){}[]` are
/// control characters.
pub fn sendkeys_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '+' | '^' | '%' | '~' | '(' | ')' | '{' | '}' | '[' | ']' => {
                escaped.push('{');
                escaped.push(c);
                escaped.push('}');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Parse `x,y,width,height` as printed by the window-bounds AppleScript.
pub fn parse_bounds(output: &str) -> Result<WindowBounds, AutomationError> {
    let parts: Vec<i32> = output
        .split(',')
        .map(|part| part.trim().parse::<f64>().map(|v| v.round() as i32))
        .collect::<Result<_, _>>()
        .map_err(|e| {
            AutomationError::PlatformError(format!("Unexpected window bounds '{output}': {e}"))
        })?;

    match parts.as_slice() {
        [x, y, width, height] => Ok(WindowBounds {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }),
        _ => Err(AutomationError::PlatformError(format!(
            "Unexpected window bounds '{output}'"
        ))),
    }
}
