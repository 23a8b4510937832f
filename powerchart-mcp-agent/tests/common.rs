#![allow(dead_code)]

use powerchart::{
    AutomationEngine, AutomationError, CoordinateTable, Key, Pacing, ScreenshotResult,
    WindowBounds,
};
use powerchart_mcp_agent::PowerChartServer;
use rmcp::model::CallToolResult;
use serde_json::Value;
use std::sync::{Arc, Mutex};

pub const COORDINATES: &str = r#"{
    "home": [
        {"x": 100, "y": 200, "name": "Patient List", "description": "Open the patient list"}
    ],
    "patient_lists": [{"x": 150, "y": 250, "name": "Pink A"}],
    "labs": [
        {"x": 300, "y": 400, "name": "Results Review"},
        {"x": 310, "y": 420, "name": "scroll down"}
    ],
    "specific_patient_list": [{"x": 40, "y": 300, "name": "Patient 1"}],
    "section_headers": {
        "default": [{"x": 20, "y": 500, "name": "Hospital Course"}]
    },
    "screen_sections": {
        "inpatient_manage": {"left_x": 0, "upper_y": 0, "right_x": 16, "lower_y": 8, "name": "Inpatient"}
    }
}"#;

/// Engine that records clicks and returns a blank screen.
#[derive(Default)]
pub struct ClickRecorder {
    clicks: Mutex<Vec<(i32, i32)>>,
}

impl ClickRecorder {
    pub fn clicks(&self) -> Vec<(i32, i32)> {
        self.clicks.lock().unwrap().clone()
    }
}

impl AutomationEngine for ClickRecorder {
    fn platform(&self) -> &'static str {
        "test"
    }

    fn click(&self, x: i32, y: i32) -> Result<(), AutomationError> {
        self.clicks.lock().unwrap().push((x, y));
        Ok(())
    }

    fn move_mouse(&self, _x: i32, _y: i32) -> Result<(), AutomationError> {
        Ok(())
    }

    fn mouse_down(&self, _x: i32, _y: i32) -> Result<(), AutomationError> {
        Ok(())
    }

    fn mouse_up(&self, _x: i32, _y: i32) -> Result<(), AutomationError> {
        Ok(())
    }

    fn type_text(&self, _text: &str) -> Result<(), AutomationError> {
        Ok(())
    }

    fn press_key(&self, _key: Key) -> Result<(), AutomationError> {
        Ok(())
    }

    fn is_process_running(&self, _name: &str) -> Result<bool, AutomationError> {
        Ok(false)
    }

    fn activate_application(&self, _name: &str) -> Result<(), AutomationError> {
        Ok(())
    }

    fn window_bounds(&self, app_name: &str) -> Result<WindowBounds, AutomationError> {
        Err(AutomationError::UnsupportedOperation(app_name.to_string()))
    }

    fn quit_application(&self, _app_name: &str) -> Result<(), AutomationError> {
        Ok(())
    }

    fn open_path(&self, _target: &str) -> Result<(), AutomationError> {
        Ok(())
    }

    fn capture_screen(&self) -> Result<ScreenshotResult, AutomationError> {
        Ok(ScreenshotResult {
            image_data: vec![255; 32 * 32 * 4],
            width: 32,
            height: 32,
            scale_factor: 1.0,
        })
    }
}

pub fn server() -> (PowerChartServer, Arc<ClickRecorder>) {
    let engine = Arc::new(ClickRecorder::default());
    let table = Arc::new(CoordinateTable::from_json_str(COORDINATES).unwrap());
    let server = PowerChartServer::with_pacing(table, engine.clone(), Pacing::none());
    (server, engine)
}

/// Serialized form of every content item of a tool result.
pub fn contents(result: &CallToolResult) -> Vec<Value> {
    result
        .content
        .iter()
        .map(|c| serde_json::to_value(c).expect("Failed to serialize content to JSON"))
        .collect()
}

pub fn first_text(result: &CallToolResult) -> String {
    let content = contents(result);
    let first = content.first().expect("Result content is empty");
    first
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("Expected a text content, got: {first}"))
        .to_string()
}
