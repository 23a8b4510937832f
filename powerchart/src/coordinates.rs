//! Coordinate table: named screen positions grouped by section and subsection,
//! plus named rectangular regions used for screenshots.
//!
//! The table is loaded once from a JSON document and is read-only afterwards.
//! Share it as `Arc<CoordinateTable>`.

use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reserved top-level key holding the screenshot regions.
pub const SCREEN_SECTIONS_KEY: &str = "screen_sections";

/// Default file name searched for by [`CoordinateTable::discover`].
pub const COORDINATES_FILE_NAME: &str = "coordinates.json";

/// A clickable location in the PowerChart UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationLocation {
    pub x: i32,
    pub y: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NavigationLocation {
    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// A rectangular screen region, in screen points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSection {
    pub left_x: i32,
    pub upper_y: i32,
    pub right_x: i32,
    pub lower_y: i32,
    pub name: String,
}

impl ScreenSection {
    pub fn width(&self) -> u32 {
        (self.right_x - self.left_x).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.lower_y - self.upper_y).max(0) as u32
    }

    /// `left_x < right_x` and `upper_y < lower_y`.
    pub fn is_well_formed(&self) -> bool {
        self.left_x < self.right_x && self.upper_y < self.lower_y
    }
}

/// Locations of one section: either a flat list or lists keyed by subsection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionEntries {
    Flat(Vec<NavigationLocation>),
    Nested(Vec<(String, Vec<NavigationLocation>)>),
}

impl SectionEntries {
    fn find(&self, name: &str, subsection: Option<&str>) -> Option<&NavigationLocation> {
        match self {
            SectionEntries::Flat(locations) => locations.iter().find(|loc| loc.is_named(name)),
            SectionEntries::Nested(subsections) => {
                if let Some(wanted) = subsection {
                    if let Some((_, locations)) = subsections.iter().find(|(sub, _)| sub == wanted)
                    {
                        return locations.iter().find(|loc| loc.is_named(name));
                    }
                }
                subsections
                    .iter()
                    .flat_map(|(_, locations)| locations.iter())
                    .find(|loc| loc.is_named(name))
            }
        }
    }
}

/// Read-only lookup table built from the coordinates file.
#[derive(Debug, Clone, Default)]
pub struct CoordinateTable {
    sections: Vec<(String, SectionEntries)>,
    screen_sections: Vec<(String, ScreenSection)>,
    source: Option<PathBuf>,
}

impl CoordinateTable {
    /// An empty table. Every lookup reports "not found".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a coordinates document. Section order follows the document.
    pub fn from_json_str(json: &str) -> Result<Self, AutomationError> {
        let root: Map<String, Value> = serde_json::from_str(json)
            .map_err(|e| AutomationError::InvalidCoordinates(e.to_string()))?;

        let mut table = Self::default();
        for (key, value) in root {
            if key == SCREEN_SECTIONS_KEY {
                table.screen_sections = parse_screen_sections(value)?;
                continue;
            }

            let entries = match value {
                Value::Array(items) => {
                    SectionEntries::Flat(parse_locations(&key, Value::Array(items))?)
                }
                Value::Object(subsections) => {
                    let mut nested = Vec::with_capacity(subsections.len());
                    for (subsection, locations) in subsections {
                        let label = format!("{key}.{subsection}");
                        nested.push((subsection, parse_locations(&label, locations)?));
                    }
                    SectionEntries::Nested(nested)
                }
                other => {
                    return Err(AutomationError::InvalidCoordinates(format!(
                        "section '{key}' must be a list or an object of lists, found {other}"
                    )))
                }
            };
            table.sections.push((key, entries));
        }

        Ok(table)
    }

    /// Read and parse a coordinates file.
    pub fn from_path(path: &Path) -> Result<Self, AutomationError> {
        let contents = std::fs::read_to_string(path)?;
        let mut table = Self::from_json_str(&contents)?;
        table.source = Some(path.to_path_buf());
        Ok(table)
    }

    /// Paths searched by [`discover`](Self::discover), in priority order.
    pub fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = explicit {
            paths.push(path.to_path_buf());
        }
        paths.push(PathBuf::from(COORDINATES_FILE_NAME));
        paths.push(Path::new("..").join(COORDINATES_FILE_NAME));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(COORDINATES_FILE_NAME));
        }
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(exe_dir.join(COORDINATES_FILE_NAME));
        }
        paths
    }

    /// Load the first candidate that exists and parses.
    pub fn load_first(paths: &[PathBuf]) -> Option<Self> {
        for path in paths {
            if !path.exists() {
                debug!("No coordinates file at {}", path.display());
                continue;
            }
            match Self::from_path(path) {
                Ok(table) => {
                    info!(
                        sections = table.sections.len(),
                        screen_sections = table.screen_sections.len(),
                        "Loaded coordinates from {}",
                        path.display()
                    );
                    return Some(table);
                }
                Err(e) => warn!("Error loading coordinates from {}: {}", path.display(), e),
            }
        }
        None
    }

    /// Search the standard locations; fall back to an empty table.
    pub fn discover(explicit: Option<&Path>) -> Self {
        Self::load_first(&Self::candidate_paths(explicit)).unwrap_or_else(|| {
            warn!("coordinates.json file not found. Proceeding with empty coordinates.");
            Self::empty()
        })
    }

    /// File the table was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Look up a location by name (case-insensitive).
    ///
    /// In a subsection-structured section, `subsection` narrows the search when
    /// it names an existing subsection; otherwise every subsection is searched
    /// in document order. Unknown sections yield `None`.
    pub fn find_location(
        &self,
        section: &str,
        name: &str,
        subsection: Option<&str>,
    ) -> Option<&NavigationLocation> {
        self.section(section)?.find(name, subsection)
    }

    pub fn section(&self, section: &str) -> Option<&SectionEntries> {
        self.sections
            .iter()
            .find(|(key, _)| key == section)
            .map(|(_, entries)| entries)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(key, _)| key.as_str())
    }

    pub fn screen_section(&self, name: &str) -> Option<&ScreenSection> {
        self.screen_sections
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, region)| region)
    }

    pub fn screen_section_names(&self) -> impl Iterator<Item = &str> {
        self.screen_sections.iter().map(|(key, _)| key.as_str())
    }

    /// Human-readable listing of every section and screenshot region.
    pub fn list_sections(&self) -> String {
        let mut out = String::from("Available PowerChart sections:\n\n");
        for section in self.section_names() {
            let _ = writeln!(out, "- {section}");
        }
        out.push_str("\nAvailable screenshot sections:\n\n");
        for region in self.screen_section_names() {
            let _ = writeln!(out, "- {region}");
        }
        out
    }

    /// Human-readable listing of the locations of one section.
    pub fn describe_section(&self, section: &str) -> String {
        let Some(entries) = self.section(section) else {
            return format!("No coordinates available for section '{section}'");
        };

        let mut out = format!("Available coordinates in section '{section}':\n\n");
        match entries {
            SectionEntries::Flat(locations) => {
                for loc in locations {
                    write_location(&mut out, "", loc);
                }
            }
            SectionEntries::Nested(subsections) => {
                for (subsection, locations) in subsections {
                    let _ = writeln!(out, "Subsection '{subsection}':");
                    for loc in locations {
                        write_location(&mut out, "  ", loc);
                    }
                    out.push('\n');
                }
            }
        }
        out
    }
}

fn write_location(out: &mut String, indent: &str, loc: &NavigationLocation) {
    let _ = write!(out, "{indent}- {}: ({}, {})", loc.name, loc.x, loc.y);
    if let Some(description) = &loc.description {
        let _ = write!(out, " - {description}");
    }
    out.push('\n');
}

fn parse_locations(label: &str, value: Value) -> Result<Vec<NavigationLocation>, AutomationError> {
    serde_json::from_value(value)
        .map_err(|e| AutomationError::InvalidCoordinates(format!("section '{label}': {e}")))
}

fn parse_screen_sections(value: Value) -> Result<Vec<(String, ScreenSection)>, AutomationError> {
    let Value::Object(regions) = value else {
        return Err(AutomationError::InvalidCoordinates(format!(
            "'{SCREEN_SECTIONS_KEY}' must be an object"
        )));
    };

    let mut parsed = Vec::with_capacity(regions.len());
    for (key, region) in regions {
        let region: ScreenSection = serde_json::from_value(region).map_err(|e| {
            AutomationError::InvalidCoordinates(format!("screen section '{key}': {e}"))
        })?;
        if !region.is_well_formed() {
            warn!(
                "Skipping screen section '{}': empty or inverted rectangle ({}, {}) - ({}, {})",
                key, region.left_x, region.upper_y, region.right_x, region.lower_y
            );
            continue;
        }
        parsed.push((key, region));
    }
    Ok(parsed)
}
