//! Named-element actions: resolve a name through the [`CoordinateTable`] and
//! drive the [`AutomationEngine`] at that point.
//!
//! Every operation returns a human-readable message. Lookup misses and driver
//! failures are reported as `Error: ...` text rather than as `Err`, because
//! callers (workflows, MCP tools) forward the message verbatim.

use crate::capture::{capture_region, encode_png};
use crate::coordinates::{CoordinateTable, NavigationLocation};
use crate::pacing::{pause, Pacing};
use crate::platforms::AutomationEngine;
use crate::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Section holding the `Patient {n}` rows of the patient list.
pub const PATIENT_LIST_SECTION: &str = "specific_patient_list";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollDirection::Up => write!(f, "up"),
            ScrollDirection::Down => write!(f, "down"),
        }
    }
}

impl FromStr for ScrollDirection {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(ScrollDirection::Up),
            "down" => Ok(ScrollDirection::Down),
            other => Err(AutomationError::InvalidArgument(format!(
                "Scroll direction must be 'up' or 'down', got '{other}'"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct Navigator {
    table: Arc<CoordinateTable>,
    engine: Arc<dyn AutomationEngine>,
    pacing: Pacing,
}

impl Navigator {
    pub fn new(table: Arc<CoordinateTable>, engine: Arc<dyn AutomationEngine>) -> Self {
        Self::with_pacing(table, engine, Pacing::default())
    }

    pub fn with_pacing(
        table: Arc<CoordinateTable>,
        engine: Arc<dyn AutomationEngine>,
        pacing: Pacing,
    ) -> Self {
        Self {
            table,
            engine,
            pacing,
        }
    }

    pub fn table(&self) -> &CoordinateTable {
        &self.table
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Single click on a named element.
    #[instrument(skip(self))]
    pub fn navigate(&self, section: &str, element: &str, subsection: Option<&str>) -> String {
        let subsection = subsection.filter(|s| !s.is_empty());
        let Some(location) = self.table.find_location(section, element, subsection) else {
            return not_found(section, element, subsection);
        };

        if let Err(e) = self.click(location) {
            return failure("click on", element, &e);
        }
        info!("Clicked on {} at ({}, {})", element, location.x, location.y);
        success("Clicked on", element, location, subsection)
    }

    /// Double click on a named element.
    #[instrument(skip(self))]
    pub fn double_click(&self, section: &str, element: &str, subsection: Option<&str>) -> String {
        let subsection = subsection.filter(|s| !s.is_empty());
        let Some(location) = self.table.find_location(section, element, subsection) else {
            return not_found(section, element, subsection);
        };

        if let Err(e) = self.double_click_at(location) {
            return failure("double-click on", element, &e);
        }
        info!(
            "Double-clicked on {} at ({}, {})",
            element, location.x, location.y
        );
        success("Double-clicked on", element, location, subsection)
    }

    /// Click the section's `scroll up` / `scroll down` element `clicks` times.
    #[instrument(skip(self))]
    pub fn scroll(&self, section: &str, direction: ScrollDirection, clicks: u32) -> String {
        let target = format!("scroll {direction}");
        let Some(location) = self.table.find_location(section, &target, None) else {
            return format!(
                "Error: Could not find scroll {direction} element for section '{section}'"
            );
        };

        for i in 0..clicks {
            if i > 0 {
                pause(self.pacing.scroll_interval);
            }
            if let Err(e) = self.click(location) {
                return failure("scroll", section, &e);
            }
        }
        format!("Scrolled {direction} {clicks} times in section '{section}'")
    }

    /// PNG of a named screen region.
    #[instrument(skip(self))]
    pub fn capture_section(&self, section: &str) -> Result<Vec<u8>, String> {
        let Some(region) = self.table.screen_section(section) else {
            return Err(format!(
                "Error: Section '{section}' not defined for screenshots"
            ));
        };

        let png = self
            .engine
            .capture_screen()
            .and_then(|shot| capture_region(&shot, region))
            .and_then(|cropped| encode_png(&cropped));
        png.map_err(|e| {
            error!("Failed to capture section '{}': {}", section, e);
            format!("Error: Failed to capture section '{section}': {e}")
        })
    }

    /// Double click the `Patient {position}` row of the patient list.
    #[instrument(skip(self))]
    pub fn click_patient_from_list(&self, position: u32) -> String {
        let name = format!("Patient {position}");
        let Some(location) = self.table.find_location(PATIENT_LIST_SECTION, &name, None) else {
            return format!("Error: Could not find patient at position {position}");
        };

        if let Err(e) = self.double_click_at(location) {
            return failure("double-click on", &name, &e);
        }
        format!(
            "Double-clicked on patient at position {position} (coordinates: {}, {})",
            location.x, location.y
        )
    }

    fn click(&self, location: &NavigationLocation) -> Result<(), AutomationError> {
        self.engine.click(location.x, location.y)?;
        pause(self.pacing.after_click);
        Ok(())
    }

    fn double_click_at(&self, location: &NavigationLocation) -> Result<(), AutomationError> {
        self.engine
            .double_click(location.x, location.y, self.pacing.double_click_interval)?;
        pause(self.pacing.after_click);
        Ok(())
    }
}

fn success(
    verb: &str,
    element: &str,
    location: &NavigationLocation,
    subsection: Option<&str>,
) -> String {
    let mut message = format!(
        "{verb} {element} (coordinates: {}, {})",
        location.x, location.y
    );
    if let Some(subsection) = subsection {
        message.push_str(&format!(" in subsection {subsection}"));
    }
    message
}

fn not_found(section: &str, element: &str, subsection: Option<&str>) -> String {
    match subsection {
        Some(subsection) => format!(
            "Error: Could not find element '{element}' in section '{section}', subsection '{subsection}'"
        ),
        None => format!("Error: Could not find element '{element}' in section '{section}'"),
    }
}

fn failure(action: &str, target: &str, e: &AutomationError) -> String {
    error!("Failed to {} {}: {}", action, target, e);
    format!("Error: Failed to {action} {target}: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_direction_parses_case_insensitively() {
        assert_eq!("UP".parse::<ScrollDirection>().unwrap(), ScrollDirection::Up);
        assert_eq!(
            "down".parse::<ScrollDirection>().unwrap(),
            ScrollDirection::Down
        );
        assert!("sideways".parse::<ScrollDirection>().is_err());
    }

    #[test]
    fn scroll_direction_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ScrollDirection::Down).unwrap(),
            "\"down\""
        );
        let up: ScrollDirection = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(up, ScrollDirection::Up);
    }

    #[test]
    fn not_found_message_mentions_subsection_only_when_given() {
        assert_eq!(
            not_found("home", "Nope", None),
            "Error: Could not find element 'Nope' in section 'home'"
        );
        assert_eq!(
            not_found("home", "Nope", Some("scrolled")),
            "Error: Could not find element 'Nope' in section 'home', subsection 'scrolled'"
        );
    }
}
