
use crate::platforms::{AutomationEngine, Key, WindowBounds};
use crate::portal::PortalPage;
use crate::{AutomationError, CoordinateTable, Navigator, Pacing, ScreenshotResult};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Click(i32, i32),
    Move(i32, i32),
    Down(i32, i32),
    Up(i32, i32),
    Type(String),
    Key(Key),
    Activate(String),
    Quit(String),
    Open(String),
    Capture,
}

/// Engine that records every call instead of touching the desktop.
#[derive(Default)]
pub struct RecordingEngine {
    events: Mutex<Vec<Event>>,
    running: Mutex<HashSet<String>>,
    fail_clicks_at: Option<(i32, i32)>,
    bounds: Option<WindowBounds>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_running(self, names: &[&str]) -> Self {
        if let Ok(mut running) = self.running.lock() {
            running.extend(names.iter().map(|n| n.to_string()));
        }
        self
    }

    pub fn failing_at(mut self, x: i32, y: i32) -> Self {
        self.fail_clicks_at = Some((x, y));
        self
    }

    pub fn with_bounds(mut self, bounds: WindowBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<(i32, i32)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Click(x, y) => Some((x, y)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl AutomationEngine for RecordingEngine {
    fn platform(&self) -> &'static str {
        "recording"
    }

    fn click(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        if self.fail_clicks_at == Some((x, y)) {
            return Err(AutomationError::PlatformError("click rejected".to_string()));
        }
        self.record(Event::Click(x, y));
        Ok(())
    }

    fn move_mouse(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.record(Event::Move(x, y));
        Ok(())
    }

    fn mouse_down(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.record(Event::Down(x, y));
        Ok(())
    }

    fn mouse_up(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.record(Event::Up(x, y));
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.record(Event::Type(text.to_string()));
        Ok(())
    }

    fn press_key(&self, key: Key) -> Result<(), AutomationError> {
        self.record(Event::Key(key));
        Ok(())
    }

    fn is_process_running(&self, name: &str) -> Result<bool, AutomationError> {
        Ok(self.running.lock().unwrap().contains(name))
    }

    fn activate_application(&self, name: &str) -> Result<(), AutomationError> {
        self.record(Event::Activate(name.to_string()));
        Ok(())
    }

    fn window_bounds(&self, app_name: &str) -> Result<WindowBounds, AutomationError> {
        self.bounds.ok_or_else(|| {
            AutomationError::UnsupportedOperation(format!("no window for {app_name}"))
        })
    }

    fn quit_application(&self, app_name: &str) -> Result<(), AutomationError> {
        self.record(Event::Quit(app_name.to_string()));
        Ok(())
    }

    fn open_path(&self, target: &str) -> Result<(), AutomationError> {
        self.record(Event::Open(target.to_string()));
        Ok(())
    }

    fn capture_screen(&self) -> Result<ScreenshotResult, AutomationError> {
        self.record(Event::Capture);
        let (width, height) = (64, 48);
        Ok(ScreenshotResult {
            image_data: vec![200; (width * height * 4) as usize],
            width,
            height,
            scale_factor: 1.0,
        })
    }
}

/// Portal page that accepts every script. Clicking `app_link` drops a
/// launch file named `download` into the download directory.
#[derive(Default)]
pub struct FakePortal {
    scripts: Mutex<Vec<String>>,
    download_dir: Mutex<Option<PathBuf>>,
    app_link: String,
    download: Option<String>,
    missing: Option<String>,
}

impl FakePortal {
    pub fn new(app_link: &str) -> Self {
        Self {
            app_link: app_link.to_string(),
            ..Self::default()
        }
    }

    pub fn downloading(mut self, file_name: &str) -> Self {
        self.download = Some(file_name.to_string());
        self
    }

    /// Scripts mentioning `text` find nothing on the page.
    pub fn without(mut self, text: &str) -> Self {
        self.missing = Some(text.to_string());
        self
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

impl PortalPage for FakePortal {
    fn evaluate(&self, script: &str) -> Result<Value, AutomationError> {
        self.scripts.lock().unwrap().push(script.to_string());
        if self.missing.as_deref().is_some_and(|text| script.contains(text)) {
            return Ok(Value::Bool(false));
        }
        if script.contains(&self.app_link) {
            let dir = self.download_dir.lock().unwrap().clone();
            if let (Some(dir), Some(name)) = (dir, &self.download) {
                std::fs::write(dir.join(name), "[WFClient]")?;
            }
        }
        Ok(Value::Bool(true))
    }

    fn allow_downloads(&self, dir: &Path) -> Result<(), AutomationError> {
        *self.download_dir.lock().unwrap() = Some(dir.to_path_buf());
        Ok(())
    }
}

impl PortalPage for &FakePortal {
    fn evaluate(&self, script: &str) -> Result<Value, AutomationError> {
        (**self).evaluate(script)
    }

    fn allow_downloads(&self, dir: &Path) -> Result<(), AutomationError> {
        (**self).allow_downloads(dir)
    }
}

pub const COORDINATES: &str = r#"{
    "home": [
        {"x": 100, "y": 200, "name": "Patient List", "description": "Open the patient list"}
    ],
    "patient_lists": [
        {"x": 150, "y": 250, "name": "Pink A"}
    ],
    "labs": [
        {"x": 300, "y": 400, "name": "Results Review"},
        {"x": 310, "y": 420, "name": "scroll down"},
        {"x": 310, "y": 380, "name": "scroll up"}
    ],
    "specific_patient_list": [
        {"x": 40, "y": 300, "name": "Patient 1"},
        {"x": 40, "y": 320, "name": "Patient 2"}
    ],
    "section_headers": {
        "default": [{"x": 20, "y": 500, "name": "Hospital Course"}],
        "scrolled": [{"x": 20, "y": 300, "name": "Hospital Course"}]
    },
    "screen_sections": {
        "inpatient_manage": {"left_x": 0, "upper_y": 0, "right_x": 32, "lower_y": 24, "name": "Inpatient"}
    }
}"#;

pub fn table() -> Arc<CoordinateTable> {
    Arc::new(CoordinateTable::from_json_str(COORDINATES).unwrap())
}

pub fn navigator(engine: &Arc<RecordingEngine>) -> Navigator {
    init_tracing();
    Navigator::with_pacing(table(), engine.clone(), Pacing::none())
}
