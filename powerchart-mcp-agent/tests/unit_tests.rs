mod common;

use common::{contents, first_text, server, ClickRecorder, COORDINATES};
use powerchart::{CoordinateTable, Pacing};
use powerchart_mcp_agent::PowerChartServer;
use std::sync::Arc;
use powerchart_mcp_agent::utils::{
    ElementArgs, EmptyArgs, PatientArgs, ScrollSectionArgs, SectionArgs, WorkflowArgs,
};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::ServerHandler;

fn element(section: &str, element: &str, subsection: Option<&str>) -> Parameters<ElementArgs> {
    Parameters(ElementArgs {
        section: section.to_string(),
        element: element.to_string(),
        subsection: subsection.map(str::to_string),
    })
}

#[test]
fn scroll_args_default_to_one_click() {
    let args: ScrollSectionArgs =
        serde_json::from_str(r#"{"section": "labs", "direction": "down"}"#).unwrap();
    assert_eq!(args.clicks, 1);
    assert_eq!(args.direction, "down");
}

#[test]
fn element_args_subsection_is_optional() {
    let args: ElementArgs =
        serde_json::from_str(r#"{"section": "home", "element": "Patient List"}"#).unwrap();
    assert!(args.subsection.is_none());
}

#[tokio::test]
async fn navigate_to_returns_click_message() {
    let (server, engine) = server();
    let result = server
        .navigate_to(element("home", "patient list", None))
        .await
        .unwrap();

    assert_eq!(
        first_text(&result),
        "Clicked on patient list (coordinates: 100, 200)"
    );
    assert_eq!(engine.clicks(), vec![(100, 200)]);
}

#[tokio::test]
async fn double_click_reports_missing_subsection_element() {
    let (server, engine) = server();
    let result = server
        .double_click_element(element("section_headers", "Problem List", Some("default")))
        .await
        .unwrap();

    assert_eq!(
        first_text(&result),
        "Error: Could not find element 'Problem List' in section 'section_headers', subsection 'default'"
    );
    assert!(engine.clicks().is_empty());
}

#[tokio::test]
async fn scroll_section_rejects_unknown_direction() {
    let (server, _engine) = server();
    let result = server
        .scroll_section(Parameters(ScrollSectionArgs {
            section: "labs".to_string(),
            direction: "sideways".to_string(),
            clicks: 1,
        }))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn scroll_section_clicks_repeatedly() {
    let (server, engine) = server();
    let result = server
        .scroll_section(Parameters(ScrollSectionArgs {
            section: "labs".to_string(),
            direction: "down".to_string(),
            clicks: 2,
        }))
        .await
        .unwrap();

    assert_eq!(first_text(&result), "Scrolled down 2 times in section 'labs'");
    assert_eq!(engine.clicks(), vec![(310, 420), (310, 420)]);
}

#[tokio::test]
async fn capture_returns_png_image_content() {
    let (server, _engine) = server();
    let result = server
        .capture_screen_section(Parameters(SectionArgs {
            section: "inpatient_manage".to_string(),
        }))
        .await
        .unwrap();

    let content = contents(&result);
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["type"], "image");
    assert_eq!(content[0]["mimeType"], "image/png");
}

#[tokio::test]
async fn capture_of_unknown_section_is_text() {
    let (server, _engine) = server();
    let result = server
        .capture_screen_section(Parameters(SectionArgs {
            section: "home".to_string(),
        }))
        .await
        .unwrap();

    assert_eq!(
        first_text(&result),
        "Error: Section 'home' not defined for screenshots"
    );
}

#[tokio::test]
async fn click_patient_double_clicks_the_row() {
    let (server, engine) = server();
    let result = server
        .click_patient_from_list(Parameters(PatientArgs { position: 1 }))
        .await
        .unwrap();

    assert_eq!(
        first_text(&result),
        "Double-clicked on patient at position 1 (coordinates: 40, 300)"
    );
    assert_eq!(engine.clicks(), vec![(40, 300), (40, 300)]);
}

#[tokio::test]
async fn unknown_workflow_clicks_nothing() {
    let (server, engine) = server();
    let result = server
        .perform_workflow(Parameters(WorkflowArgs {
            workflow_name: "nope".to_string(),
        }))
        .await
        .unwrap();

    assert_eq!(first_text(&result), "Error: Workflow 'nope' not defined");
    assert!(engine.clicks().is_empty());
}

#[tokio::test]
async fn check_patient_details_returns_log_and_images() {
    let (server, engine) = server();
    let result = server
        .perform_workflow(Parameters(WorkflowArgs {
            workflow_name: "check_patient_details".to_string(),
        }))
        .await
        .unwrap();

    let text = first_text(&result);
    assert!(text.starts_with("Workflow 'check_patient_details' completed. Steps performed:\n"));
    assert!(text.contains("Error: Could not find element 'Provider View' in section 'specific_patient'"));
    assert!(text.contains("Clicked on Hospital Course (coordinates: 20, 500) in subsection default"));
    assert!(text.contains("Error: Could not find element 'Problem List' in section 'section_headers', subsection 'default'"));
    assert_eq!(text.matches("Screen section 'inpatient_manage' captured").count(), 2);

    let content = contents(&result);
    assert_eq!(content.len(), 3);
    assert!(content[1..].iter().all(|c| c["type"] == "image"));
    assert_eq!(engine.clicks(), vec![(20, 500)]);
}

#[tokio::test]
async fn listings_come_from_the_table() {
    let (server, _engine) = server();

    let sections = first_text(
        &server
            .list_sections(Parameters(EmptyArgs {}))
            .await
            .unwrap(),
    );
    assert!(sections.starts_with("Available PowerChart sections:\n\n- home\n"));
    assert!(sections.contains("\nAvailable screenshot sections:\n\n- inpatient_manage\n"));

    let coords = first_text(
        &server
            .get_coordinates(Parameters(SectionArgs {
                section: "home".to_string(),
            }))
            .await
            .unwrap(),
    );
    assert_eq!(
        coords,
        "Available coordinates in section 'home':\n\n- Patient List: (100, 200) - Open the patient list\n"
    );
}

#[test]
fn resources_resolve_to_listings() {
    let (server, _engine) = server();
    assert_eq!(
        server.resource_text("sections://list"),
        Some(server.table().list_sections())
    );
    assert_eq!(
        server.resource_text("coordinates://nowhere").as_deref(),
        Some("No coordinates available for section 'nowhere'")
    );
    assert_eq!(server.resource_text("coordinates://"), None);
    assert_eq!(server.resource_text("file:///etc/passwd"), None);
}

#[test]
fn server_info_advertises_tools_and_resources() {
    let (server, _engine) = server();
    let info = server.get_info();
    assert!(info.capabilities.tools.is_some());
    assert!(info.capabilities.resources.is_some());
    let instructions = info.instructions.unwrap();
    assert!(instructions.contains("view_media_gallery"));
}

#[tokio::test]
async fn server_uses_an_explicit_coordinates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.json");
    std::fs::write(&path, COORDINATES).unwrap();

    let table = CoordinateTable::discover(Some(&path));
    assert_eq!(table.source(), Some(path.as_path()));

    let engine = Arc::new(ClickRecorder::default());
    let server = PowerChartServer::with_pacing(Arc::new(table), engine.clone(), Pacing::none());
    server
        .navigate_to(element("patient_lists", "Pink A", None))
        .await
        .unwrap();
    assert_eq!(engine.clicks(), vec![(150, 250)]);
}
