//! Mouse and keyboard injection through `enigo`.
//!
//! A fresh `Enigo` connection is opened per call; the handle is not `Send` on
//! every platform and the engines are shared across threads.

use super::Key;
use crate::AutomationError;
use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};

fn with_enigo<T>(
    action: &str,
    f: impl FnOnce(&mut Enigo) -> enigo::InputResult<T>,
) -> Result<T, AutomationError> {
    let mut enigo = Enigo::new(&Settings::default()).map_err(|e| {
        AutomationError::PlatformError(format!("Failed to initialize input simulator: {e:?}"))
    })?;
    f(&mut enigo).map_err(|e| AutomationError::PlatformError(format!("{action} failed: {e:?}")))
}

pub(crate) fn click(x: i32, y: i32) -> Result<(), AutomationError> {
    with_enigo("click", |enigo| {
        enigo.move_mouse(x, y, Coordinate::Abs)?;
        enigo.button(Button::Left, Direction::Click)
    })
}

pub(crate) fn move_mouse(x: i32, y: i32) -> Result<(), AutomationError> {
    with_enigo("mouse move", |enigo| enigo.move_mouse(x, y, Coordinate::Abs))
}

pub(crate) fn mouse_button(x: i32, y: i32, direction: Direction) -> Result<(), AutomationError> {
    with_enigo("mouse button", |enigo| {
        enigo.move_mouse(x, y, Coordinate::Abs)?;
        enigo.button(Button::Left, direction)
    })
}

pub(crate) fn mouse_down(x: i32, y: i32) -> Result<(), AutomationError> {
    mouse_button(x, y, Direction::Press)
}

pub(crate) fn mouse_up(x: i32, y: i32) -> Result<(), AutomationError> {
    mouse_button(x, y, Direction::Release)
}

pub(crate) fn type_text(text: &str) -> Result<(), AutomationError> {
    with_enigo("typing", |enigo| enigo.text(text))
}

pub(crate) fn press_key(key: Key) -> Result<(), AutomationError> {
    let key = match key {
        Key::Tab => enigo::Key::Tab,
        Key::Return => enigo::Key::Return,
    };
    with_enigo("key press", |enigo| enigo.key(key, Direction::Click))
}
