// Data models shared by the workspace, the services and the export pipeline

pub mod state_machine;

pub use state_machine::{AnalysisState, StateTransitionError};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// The diagram kinds the analysis service can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramType {
    Class,
    UseCase,
    Sequence,
}

impl DiagramType {
    /// Returns all diagram types in selector order
    pub fn all() -> &'static [DiagramType] {
        &[DiagramType::Class, DiagramType::UseCase, DiagramType::Sequence]
    }

    /// Wire name used by the project store and analysis service
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramType::Class => "CLASS",
            DiagramType::UseCase => "USECASE",
            DiagramType::Sequence => "SEQUENCE",
        }
    }

    /// Human readable label shown in the diagram type selector
    pub fn display_name(&self) -> &'static str {
        match self {
            DiagramType::Class => "Class Diagram",
            DiagramType::UseCase => "Use Case Diagram",
            DiagramType::Sequence => "Sequence Diagram",
        }
    }
}

impl Default for DiagramType {
    fn default() -> Self {
        DiagramType::Class
    }
}

impl std::fmt::Display for DiagramType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DiagramType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CLASS" => Ok(DiagramType::Class),
            // The store persists use case diagrams as USE_CASE
            "USECASE" | "USE_CASE" => Ok(DiagramType::UseCase),
            "SEQUENCE" => Ok(DiagramType::Sequence),
            _ => Err(format!(
                "Unknown diagram type: '{}'. Expected one of: CLASS, USECASE, SEQUENCE",
                s
            )),
        }
    }
}

impl Serialize for DiagramType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DiagramType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single generated diagram. Never mutated after creation; a new analysis
/// produces a new artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramArtifact {
    pub diagram_type: DiagramType,
    pub markup: String,
}

impl DiagramArtifact {
    pub fn new(diagram_type: DiagramType, markup: impl Into<String>) -> Self {
        Self {
            diagram_type,
            markup: markup.into(),
        }
    }
}

/// One detected design pattern and why it applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSuggestion {
    #[serde(alias = "patternName")]
    pub name: String,
    #[serde(alias = "explanation")]
    pub description: String,
}

/// Pattern name -> explanation, in the order the service reported them.
///
/// Keys are unique. A set is always replaced as a whole by the next analysis,
/// never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSet(IndexMap<String, String>);

impl PatternSet {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pattern names in display order
    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Cards for the patterns view, one per pattern
    pub fn cards(&self) -> Vec<PatternSuggestion> {
        self.0
            .iter()
            .map(|(name, description)| PatternSuggestion {
                name: name.clone(),
                description: description.clone(),
            })
            .collect()
    }
}

impl FromIterator<(String, String)> for PatternSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<PatternSuggestion>> for PatternSet {
    /// Later duplicates overwrite earlier ones but keep the first position
    fn from(suggestions: Vec<PatternSuggestion>) -> Self {
        suggestions
            .into_iter()
            .map(|s| (s.name, s.description))
            .collect()
    }
}

/// A diagram as persisted by the project store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDiagram {
    #[serde(default)]
    pub id: Option<u64>,
    /// Raw type string; validated when the workspace loads it
    #[serde(default, rename = "type")]
    pub diagram_type: Option<String>,
    #[serde(default, alias = "plantUml")]
    pub plant_uml_code: Option<String>,
}

/// Working copy of a project as returned by the project store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub diagrams: Vec<StoredDiagram>,
    #[serde(default)]
    pub pattern_suggestions: Vec<PatternSuggestion>,
}

impl Project {
    /// The diagram the workspace shows after loading: the last one generated
    pub fn latest_diagram(&self) -> Option<&StoredDiagram> {
        self.diagrams.last()
    }
}

/// Input of one orchestration cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub project_id: u64,
    pub requirements: String,
    pub diagram_type: DiagramType,
}

/// The artifact/pattern pair currently published by the orchestrator.
///
/// Both halves are swapped together; `revision` grows by one per accepted
/// analysis or project load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentDiagram {
    pub artifact: Arc<DiagramArtifact>,
    pub patterns: Arc<PatternSet>,
    pub revision: u64,
}

/// Export target formats offered in the export modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpg,
    Pdf,
    Svg,
}

impl ExportFormat {
    pub fn all() -> &'static [ExportFormat] {
        &[
            ExportFormat::Png,
            ExportFormat::Jpg,
            ExportFormat::Pdf,
            ExportFormat::Svg,
        ]
    }

    /// File extension of the delivered file
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Svg => "svg",
        }
    }

    /// MIME type of the delivered file
    pub fn mime_type(&self) -> String {
        mime_guess::from_ext(self.extension())
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "pdf" => Ok(ExportFormat::Pdf),
            "svg" => Ok(ExportFormat::Svg),
            _ => Err(format!(
                "Unknown export format: '{}'. Expected one of: png, jpg, pdf, svg",
                s
            )),
        }
    }
}

/// Where a share link is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareChannel {
    Clipboard,
    WhatsApp,
    Facebook,
    Gmail,
}

impl ShareChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareChannel::Clipboard => "clipboard",
            ShareChannel::WhatsApp => "whatsapp",
            ShareChannel::Facebook => "facebook",
            ShareChannel::Gmail => "gmail",
        }
    }
}

impl std::fmt::Display for ShareChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShareChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clipboard" => Ok(ShareChannel::Clipboard),
            "whatsapp" => Ok(ShareChannel::WhatsApp),
            "facebook" => Ok(ShareChannel::Facebook),
            "gmail" | "email" => Ok(ShareChannel::Gmail),
            _ => Err(format!(
                "Unknown share channel: '{}'. Expected one of: clipboard, whatsapp, facebook, gmail",
                s
            )),
        }
    }
}

/// A resolved share destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareTarget {
    pub url: String,
    pub channel: ShareChannel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagram_type_parse_accepts_wire_names() {
        assert_eq!("CLASS".parse::<DiagramType>().unwrap(), DiagramType::Class);
        assert_eq!("usecase".parse::<DiagramType>().unwrap(), DiagramType::UseCase);
        assert_eq!("USE_CASE".parse::<DiagramType>().unwrap(), DiagramType::UseCase);
        assert_eq!(
            "Sequence".parse::<DiagramType>().unwrap(),
            DiagramType::Sequence
        );
    }

    #[test]
    fn test_diagram_type_parse_rejects_unknown() {
        let err = "FLOWCHART".parse::<DiagramType>().unwrap_err();
        assert!(err.contains("FLOWCHART"));
        assert!("".parse::<DiagramType>().is_err());
    }

    #[test]
    fn test_diagram_type_serializes_as_wire_name() {
        let json = serde_json::to_string(&DiagramType::UseCase).unwrap();
        assert_eq!(json, "\"USECASE\"");
    }

    #[test]
    fn test_pattern_set_keeps_service_order() {
        let json = r#"{"Strategy":"a","Singleton":"b","Observer":"c"}"#;
        let set: PatternSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.names(), vec!["Strategy", "Singleton", "Observer"]);
        assert_eq!(set.get("Singleton"), Some("b"));
    }

    #[test]
    fn test_pattern_set_from_suggestions_dedupes_names() {
        let set = PatternSet::from(vec![
            PatternSuggestion {
                name: "Factory Method".into(),
                description: "first".into(),
            },
            PatternSuggestion {
                name: "Factory Method".into(),
                description: "second".into(),
            },
        ]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("Factory Method"), Some("second"));
    }

    #[test]
    fn test_project_accepts_store_field_names() {
        let json = r#"{
            "id": 7,
            "name": "Shop",
            "requirements": "Users place orders",
            "diagrams": [
                {"id": 1, "type": "CLASS", "plantUmlCode": "classDiagram\nclass A"},
                {"id": 2, "type": "SEQUENCE", "plantUmlCode": "sequenceDiagram"}
            ],
            "patternSuggestions": [
                {"name": "Observer", "explanation": "Notifies listeners."},
                {"patternName": "Strategy", "description": "Swappable pricing."}
            ]
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        let latest = project.latest_diagram().unwrap();
        assert_eq!(latest.diagram_type.as_deref(), Some("SEQUENCE"));
        assert_eq!(project.pattern_suggestions[0].description, "Notifies listeners.");
        assert_eq!(project.pattern_suggestions[1].name, "Strategy");
    }

    #[test]
    fn test_export_format_mime_types() {
        assert_eq!(ExportFormat::Png.mime_type(), "image/png");
        assert_eq!(ExportFormat::Jpg.mime_type(), "image/jpeg");
        assert_eq!(ExportFormat::Svg.mime_type(), "image/svg+xml");
        assert_eq!(ExportFormat::Pdf.mime_type(), "application/pdf");
    }

    #[test]
    fn test_share_channel_parse() {
        assert_eq!(
            "WhatsApp".parse::<ShareChannel>().unwrap(),
            ShareChannel::WhatsApp
        );
        assert!("telegram".parse::<ShareChannel>().is_err());
    }
}
