// Requirement text and diagram type selection

use super::WorkspaceError;
use crate::models::{DiagramType, Project};
use serde::{Deserialize, Serialize};

/// Initial requirement content a workspace is opened with, e.g. from the
/// template gallery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementSeed {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub diagram_type: Option<DiagramType>,
}

impl RequirementSeed {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            diagram_type: None,
        }
    }
}

/// The requirement text being edited and the selected diagram type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementStore {
    text: String,
    diagram_type: DiagramType,
}

impl RequirementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn diagram_type(&self) -> DiagramType {
        self.diagram_type
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Select a diagram type by wire name. Unknown names are rejected and the
    /// previous selection stays.
    pub fn set_diagram_type(&mut self, value: &str) -> Result<DiagramType, WorkspaceError> {
        let parsed = value
            .parse::<DiagramType>()
            .map_err(|_| WorkspaceError::InvalidDiagramType(value.to_string()))?;
        self.diagram_type = parsed;
        Ok(parsed)
    }

    pub fn select(&mut self, diagram_type: DiagramType) {
        self.diagram_type = diagram_type;
    }

    pub fn load(&mut self, seed: &RequirementSeed) {
        if let Some(ref text) = seed.text {
            self.text = text.clone();
        }
        if let Some(diagram_type) = seed.diagram_type {
            self.diagram_type = diagram_type;
        }
    }

    /// Take over what the project store persisted: non-empty requirements
    /// replace the seed, and the last diagram's type becomes the selection.
    pub fn apply_project(&mut self, project: &Project) {
        if let Some(ref requirements) = project.requirements {
            if !requirements.trim().is_empty() {
                self.text = requirements.clone();
            }
        }
        let stored_type = project
            .latest_diagram()
            .and_then(|d| d.diagram_type.as_deref())
            .and_then(|t| t.parse::<DiagramType>().ok());
        if let Some(diagram_type) = stored_type {
            self.diagram_type = diagram_type;
        }
    }
}
