use anyhow::Result;
use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Serialize, Deserialize, JsonSchema)]
pub struct EmptyArgs {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ElementArgs {
    #[schemars(description = "Section of PowerChart where the element is located, e.g. 'home' or 'labs'")]
    pub section: String,
    #[schemars(description = "Name of the UI element (case-insensitive)")]
    pub element: String,
    #[schemars(
        description = "Optional subsection for sections that have them, e.g. 'default' or 'scrolled'"
    )]
    pub subsection: Option<String>,
}

fn default_clicks() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScrollSectionArgs {
    #[schemars(description = "Section of PowerChart to scroll")]
    pub section: String,
    #[schemars(description = "Direction to scroll: 'up' or 'down'")]
    pub direction: String,
    #[serde(default = "default_clicks")]
    #[schemars(description = "Number of scroll clicks to perform (default 1)")]
    pub clicks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionArgs {
    #[schemars(description = "Name of the section")]
    pub section: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PatientArgs {
    #[schemars(description = "1-based position of the patient in the patient list")]
    pub position: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowArgs {
    #[schemars(
        description = "Name of the workflow: open_patient_list, check_documentation, view_lab_results, check_patient_details or view_media_gallery"
    )]
    pub workflow_name: String,
}

pub fn init_logging() -> Result<()> {
    let log_level = env::var("LOG_LEVEL")
        .map(|level| match level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    // stdout carries the protocol on the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
