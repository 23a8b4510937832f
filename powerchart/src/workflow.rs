//! Fixed, named sequences of navigate and capture steps.

use crate::navigator::Navigator;
use crate::pacing::pause;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowStep {
    /// Click a named element; see [`Navigator::navigate`].
    Navigate {
        section: String,
        element: String,
        subsection: Option<String>,
    },
    /// Capture a named screen region.
    Capture { section: String },
}

impl WorkflowStep {
    pub fn navigate(section: &str, element: &str) -> Self {
        WorkflowStep::Navigate {
            section: section.to_string(),
            element: element.to_string(),
            subsection: None,
        }
    }

    pub fn navigate_in(section: &str, element: &str, subsection: &str) -> Self {
        WorkflowStep::Navigate {
            section: section.to_string(),
            element: element.to_string(),
            subsection: Some(subsection.to_string()),
        }
    }

    pub fn capture(section: &str) -> Self {
        WorkflowStep::Capture {
            section: section.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub name: String,
    pub steps: Vec<WorkflowStep>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }
}

/// The workflows shipped with the agent.
pub fn builtin_workflows() -> Vec<Workflow> {
    use WorkflowStep as S;
    vec![
        Workflow::new(
            "open_patient_list",
            vec![
                S::navigate("home", "Patient List"),
                S::navigate("patient_lists", "Pink A"),
            ],
        ),
        Workflow::new(
            "check_documentation",
            vec![
                S::navigate("specific_patient", "Provider View"),
                S::navigate("documentation", "Documentation"),
                S::capture("inpatient_manage"),
            ],
        ),
        Workflow::new(
            "view_lab_results",
            vec![
                S::navigate("specific_patient", "Provider View"),
                S::navigate("labs", "Results Review"),
                S::navigate("labs", "All Laboratory"),
            ],
        ),
        Workflow::new(
            "check_patient_details",
            vec![
                S::navigate("specific_patient", "Provider View"),
                S::navigate("specific_patient", "Inpatient/Manage"),
                S::navigate_in("section_headers", "Hospital Course", "default"),
                S::capture("inpatient_manage"),
                S::navigate_in("section_headers", "Problem List", "default"),
                S::capture("inpatient_manage"),
            ],
        ),
        Workflow::new(
            "view_media_gallery",
            vec![
                S::navigate("specific_patient", "Provider View"),
                S::navigate("specific_patient", "Inpatient/Manage"),
                S::navigate_in("section_headers", "Media Gallery", "default"),
                S::capture("media_gallery_folder"),
            ],
        ),
    ]
}

/// A PNG captured by a workflow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCapture {
    pub section: String,
    pub png: Vec<u8>,
}

/// Outcome of one workflow run: a message per step plus any captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    pub workflow: String,
    pub steps: Vec<String>,
    pub captures: Vec<SectionCapture>,
}

impl fmt::Display for WorkflowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Workflow '{}' completed. Steps performed:\n{}",
            self.workflow,
            self.steps.join("\n")
        )
    }
}

/// Runs workflows step by step. A failed step is recorded and the run
/// continues with the next one.
#[derive(Clone)]
pub struct WorkflowRunner {
    navigator: Navigator,
    workflows: Vec<Workflow>,
}

impl WorkflowRunner {
    pub fn new(navigator: Navigator) -> Self {
        Self::with_workflows(navigator, builtin_workflows())
    }

    pub fn with_workflows(navigator: Navigator, workflows: Vec<Workflow>) -> Self {
        Self {
            navigator,
            workflows,
        }
    }

    pub fn workflow_names(&self) -> Vec<&str> {
        self.workflows.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.name == name)
    }

    /// Run a workflow by name. An unknown name is an `Err` carrying the
    /// message to show, and nothing is clicked.
    pub fn perform(&self, name: &str) -> Result<WorkflowReport, String> {
        let Some(workflow) = self.workflow(name) else {
            warn!("Workflow '{}' not defined", name);
            return Err(format!("Error: Workflow '{name}' not defined"));
        };

        info!(steps = workflow.steps.len(), "Starting workflow '{}'", name);
        let mut report = WorkflowReport {
            workflow: workflow.name.clone(),
            steps: Vec::with_capacity(workflow.steps.len()),
            captures: Vec::new(),
        };

        for step in &workflow.steps {
            match step {
                WorkflowStep::Navigate {
                    section,
                    element,
                    subsection,
                } => {
                    let message =
                        self.navigator
                            .navigate(section, element, subsection.as_deref());
                    report.steps.push(message);
                    pause(self.navigator.pacing().between_steps);
                }
                WorkflowStep::Capture { section } => {
                    if self.navigator.table().screen_section(section).is_none() {
                        report
                            .steps
                            .push(format!("Error: Screen section '{section}' not found"));
                        continue;
                    }
                    match self.navigator.capture_section(section) {
                        Ok(png) => {
                            report
                                .steps
                                .push(format!("Screen section '{section}' captured"));
                            report.captures.push(SectionCapture {
                                section: section.clone(),
                                png,
                            });
                        }
                        Err(message) => report.steps.push(message),
                    }
                }
            }
        }

        info!("Workflow '{}' finished", name);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_workflow_names_are_unique() {
        let workflows = builtin_workflows();
        let mut names: Vec<_> = workflows.iter().map(|w| w.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn check_patient_details_alternates_headers_and_captures() {
        let workflows = builtin_workflows();
        let workflow = workflows
            .iter()
            .find(|w| w.name == "check_patient_details")
            .unwrap();
        assert_eq!(workflow.steps.len(), 6);
        assert_eq!(
            workflow.steps[2],
            WorkflowStep::navigate_in("section_headers", "Hospital Course", "default")
        );
        assert_eq!(workflow.steps[5], WorkflowStep::capture("inpatient_manage"));
    }

    #[test]
    fn report_text_joins_step_messages() {
        let report = WorkflowReport {
            workflow: "demo".to_string(),
            steps: vec!["one".to_string(), "two".to_string()],
            captures: Vec::new(),
        };
        assert_eq!(
            report.to_string(),
            "Workflow 'demo' completed. Steps performed:\none\ntwo"
        );
    }
}
