use crate::utils::{
    ElementArgs, EmptyArgs, PatientArgs, ScrollSectionArgs, SectionArgs, WorkflowArgs,
};
use base64::{engine::general_purpose, Engine as _};
use powerchart::{
    AutomationEngine, CoordinateTable, Navigator, Pacing, ScrollDirection, WorkflowRunner,
};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourceTemplatesResult, ListResourcesResult,
    PaginatedRequestParam, ProtocolVersion, RawResource, ReadResourceRequestParam,
    ReadResourceResult, ResourceContents, ResourceTemplate, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{tool, Error as McpError, RoleServer, ServerHandler};
use rmcp::{tool_handler, tool_router};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

pub const SECTIONS_URI: &str = "sections://list";
pub const COORDINATES_URI_PREFIX: &str = "coordinates://";

#[derive(Clone)]
pub struct PowerChartServer {
    navigator: Navigator,
    runner: WorkflowRunner,
    tool_router: ToolRouter<Self>,
}

/// Run a blocking automation call off the async runtime.
async fn run_blocking<T, F>(f: F) -> Result<T, McpError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        McpError::internal_error(
            "Automation task failed",
            Some(json!({"reason": e.to_string()})),
        )
    })
}

fn png_content(png: &[u8]) -> Content {
    Content::image(general_purpose::STANDARD.encode(png), "image/png".to_string())
}

#[tool_router]
impl PowerChartServer {
    pub fn new(table: Arc<CoordinateTable>, engine: Arc<dyn AutomationEngine>) -> Self {
        Self::with_pacing(table, engine, Pacing::default())
    }

    pub fn with_pacing(
        table: Arc<CoordinateTable>,
        engine: Arc<dyn AutomationEngine>,
        pacing: Pacing,
    ) -> Self {
        let navigator = Navigator::with_pacing(table, engine, pacing);
        Self {
            runner: WorkflowRunner::new(navigator.clone()),
            navigator,
            tool_router: Self::tool_router(),
        }
    }

    pub fn table(&self) -> &CoordinateTable {
        self.navigator.table()
    }

    #[tool(
        description = "Navigate to a specific element within a section of PowerChart by clicking on it."
    )]
    pub async fn navigate_to(
        &self,
        Parameters(args): Parameters<ElementArgs>,
    ) -> Result<CallToolResult, McpError> {
        let navigator = self.navigator.clone();
        let message = run_blocking(move || {
            navigator.navigate(&args.section, &args.element, args.subsection.as_deref())
        })
        .await?;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(description = "Double-click on a specific element within a section of PowerChart.")]
    pub async fn double_click_element(
        &self,
        Parameters(args): Parameters<ElementArgs>,
    ) -> Result<CallToolResult, McpError> {
        let navigator = self.navigator.clone();
        let message = run_blocking(move || {
            navigator.double_click(&args.section, &args.element, args.subsection.as_deref())
        })
        .await?;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(
        description = "Scroll up or down within a section of PowerChart by clicking its scroll button."
    )]
    pub async fn scroll_section(
        &self,
        Parameters(args): Parameters<ScrollSectionArgs>,
    ) -> Result<CallToolResult, McpError> {
        let direction = args
            .direction
            .parse::<ScrollDirection>()
            .map_err(|e| {
                McpError::invalid_params(
                    "Invalid scroll direction",
                    Some(json!({"reason": e.to_string(), "direction": args.direction})),
                )
            })?;

        let navigator = self.navigator.clone();
        let message =
            run_blocking(move || navigator.scroll(&args.section, direction, args.clicks)).await?;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(description = "Capture a screenshot of a named screen section of PowerChart.")]
    pub async fn capture_screen_section(
        &self,
        Parameters(args): Parameters<SectionArgs>,
    ) -> Result<CallToolResult, McpError> {
        let navigator = self.navigator.clone();
        let captured = run_blocking(move || navigator.capture_section(&args.section)).await?;
        let content = match captured {
            Ok(png) => png_content(&png),
            Err(message) => Content::text(message),
        };
        Ok(CallToolResult::success(vec![content]))
    }

    #[tool(description = "Double-click on a patient in the patient list by position (1-based).")]
    pub async fn click_patient_from_list(
        &self,
        Parameters(args): Parameters<PatientArgs>,
    ) -> Result<CallToolResult, McpError> {
        let navigator = self.navigator.clone();
        let message =
            run_blocking(move || navigator.click_patient_from_list(args.position)).await?;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(
        description = "Perform a predefined workflow in PowerChart. Returns the step log followed by one image per captured section."
    )]
    pub async fn perform_workflow(
        &self,
        Parameters(args): Parameters<WorkflowArgs>,
    ) -> Result<CallToolResult, McpError> {
        let runner = self.runner.clone();
        let outcome = run_blocking(move || runner.perform(&args.workflow_name)).await?;
        let contents = match outcome {
            Ok(report) => {
                let mut contents = vec![Content::text(report.to_string())];
                contents.extend(report.captures.iter().map(|c| png_content(&c.png)));
                contents
            }
            Err(message) => vec![Content::text(message)],
        };
        Ok(CallToolResult::success(contents))
    }

    #[tool(description = "List all available PowerChart sections and screenshot sections.")]
    pub async fn list_sections(
        &self,
        Parameters(_args): Parameters<EmptyArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            self.table().list_sections(),
        )]))
    }

    #[tool(description = "Get the available coordinates for a specific section.")]
    pub async fn get_coordinates(
        &self,
        Parameters(args): Parameters<SectionArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            self.table().describe_section(&args.section),
        )]))
    }

    /// Text behind a resource URI, if it names one.
    pub fn resource_text(&self, uri: &str) -> Option<String> {
        if uri == SECTIONS_URI {
            return Some(self.table().list_sections());
        }
        uri.strip_prefix(COORDINATES_URI_PREFIX)
            .filter(|section| !section.is_empty())
            .map(|section| self.table().describe_section(section))
    }
}

#[tool_handler]
impl ServerHandler for PowerChartServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(get_server_instructions(&self.runner)),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut resources = vec![RawResource::new(SECTIONS_URI, "sections").no_annotation()];
        resources.extend(self.table().section_names().map(|section| {
            RawResource::new(format!("{COORDINATES_URI_PREFIX}{section}"), section.to_string())
                .no_annotation()
        }));
        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let template: ResourceTemplate = serde_json::from_value(json!({
            "uriTemplate": format!("{COORDINATES_URI_PREFIX}{{section}}"),
            "name": "coordinates",
            "description": "Available coordinates for a specific section",
            "mimeType": "text/plain",
        }))
        .map_err(|e| {
            McpError::internal_error(
                "Failed to build resource template",
                Some(json!({"reason": e.to_string()})),
            )
        })?;
        Ok(ListResourceTemplatesResult {
            resource_templates: vec![template],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match self.resource_text(&uri) {
            Some(text) => {
                info!("Serving resource {}", uri);
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::text(text, uri)],
                })
            }
            None => {
                warn!("Unknown resource {}", uri);
                Err(McpError::resource_not_found(
                    "resource_not_found",
                    Some(json!({"uri": uri})),
                ))
            }
        }
    }
}

fn get_server_instructions(runner: &WorkflowRunner) -> String {
    format!(
        "
You control a PowerChart electronic health record session running inside Citrix Viewer. The remote desktop exposes no accessibility tree, so every action clicks a screen position looked up by name in the coordinate table.

1.  Call `list_sections` first, then `get_coordinates` for a section to see the element names it knows. Element names match case-insensitively.
2.  `navigate_to` single-clicks an element, `double_click_element` double-clicks it, and `click_patient_from_list` opens a patient by row position.
3.  `capture_screen_section` returns a PNG of a named screenshot section. Use it to read what is on screen after navigating.
4.  The session gives no feedback after a click. Actions are paced with fixed delays, so verify the outcome with a capture before relying on it.
5.  Errors come back as text starting with `Error:`. Nothing is retried.

Predefined workflows for `perform_workflow`: {}
",
        runner.workflow_names().join(", ")
    )
}
