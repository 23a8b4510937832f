//! Coordinate-driven automation of a PowerChart session
//!
//! PowerChart runs inside a remote-desktop client, so nothing in its UI is
//! reachable through accessibility APIs. Every action here is a click,
//! keystroke or screenshot at a screen position looked up by name from a
//! [`CoordinateTable`].
//!
//! Pacing between actions is a fixed sleep. The remote session sends no
//! feedback signal, so an action cannot tell whether the previous one
//! finished rendering; see [`Pacing`].

pub mod capture;
pub mod config;
pub mod coordinates;
pub mod drag;
pub mod errors;
pub mod navigator;
pub mod pacing;
pub mod platforms;
pub mod portal;
pub mod preflight;
pub mod session;
#[cfg(test)]
mod tests;
pub mod workflow;

pub use config::{Credentials, Settings};
pub use coordinates::{CoordinateTable, NavigationLocation, ScreenSection, SectionEntries};
pub use drag::{drag_and_hold, Point};
pub use errors::AutomationError;
pub use navigator::{Navigator, ScrollDirection};
pub use pacing::Pacing;
pub use platforms::{create_engine, AutomationEngine, Key, WindowBounds};
pub use portal::{ChromeBrowser, PortalPage};
pub use preflight::{wait_for_apps, PollConfig};
pub use workflow::{SectionCapture, Workflow, WorkflowReport, WorkflowRunner, WorkflowStep};

/// Holds the screenshot data
#[derive(Debug, Clone)]
pub struct ScreenshotResult {
    /// Raw RGBA pixels, row-major
    pub image_data: Vec<u8>,
    /// Width of the image in pixels
    pub width: u32,
    /// Height of the image in pixels
    pub height: u32,
    /// Pixels per screen point of the captured monitor
    pub scale_factor: f32,
}
