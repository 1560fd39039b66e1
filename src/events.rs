// Workspace notification events
// Every user-visible outcome of a workspace operation is reported here so the
// host UI can show it (toast, alert, status line).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// Event name constants
pub const EVENT_PROJECT_LOADED: &str = "project:loaded";
pub const EVENT_PROJECT_LOAD_FAILED: &str = "project:load_failed";
pub const EVENT_REQUIREMENTS_UPLOADED: &str = "requirements:uploaded";
pub const EVENT_UPLOAD_FAILED: &str = "requirements:upload_failed";
pub const EVENT_ANALYSIS_STARTED: &str = "analysis:started";
pub const EVENT_ANALYSIS_SUCCEEDED: &str = "analysis:succeeded";
pub const EVENT_ANALYSIS_FAILED: &str = "analysis:failed";
pub const EVENT_EXPORT_COMPLETED: &str = "export:completed";
pub const EVENT_EXPORT_FAILED: &str = "export:failed";
pub const EVENT_LINK_COPIED: &str = "share:link_copied";
pub const EVENT_CODE_COPIED: &str = "share:code_copied";
pub const EVENT_SHARE_OPENED: &str = "share:opened";
pub const EVENT_SHARE_FAILED: &str = "share:failed";

/// Payload for a finished analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSucceededPayload {
    pub project_id: u64,
    pub revision: u64,
    pub diagram_type: String,
    pub pattern_count: usize,
}

/// Payload for a delivered export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCompletedPayload {
    pub project_id: u64,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

/// Payload for any failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailurePayload {
    pub project_id: u64,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum WorkspaceEvent {
    ProjectLoaded { project_id: u64 },
    ProjectLoadFailed(FailurePayload),
    RequirementsUploaded { project_id: u64, characters: usize },
    UploadFailed(FailurePayload),
    AnalysisStarted { project_id: u64 },
    AnalysisSucceeded(AnalysisSucceededPayload),
    AnalysisFailed(FailurePayload),
    ExportCompleted(ExportCompletedPayload),
    ExportFailed(FailurePayload),
    LinkCopied { url: String },
    CodeCopied,
    ShareOpened { channel: String, url: String },
    ShareFailed { error: String },
}

impl WorkspaceEvent {
    /// Event name, as used by the host's event bus
    pub fn name(&self) -> &'static str {
        match self {
            WorkspaceEvent::ProjectLoaded { .. } => EVENT_PROJECT_LOADED,
            WorkspaceEvent::ProjectLoadFailed(_) => EVENT_PROJECT_LOAD_FAILED,
            WorkspaceEvent::RequirementsUploaded { .. } => EVENT_REQUIREMENTS_UPLOADED,
            WorkspaceEvent::UploadFailed(_) => EVENT_UPLOAD_FAILED,
            WorkspaceEvent::AnalysisStarted { .. } => EVENT_ANALYSIS_STARTED,
            WorkspaceEvent::AnalysisSucceeded(_) => EVENT_ANALYSIS_SUCCEEDED,
            WorkspaceEvent::AnalysisFailed(_) => EVENT_ANALYSIS_FAILED,
            WorkspaceEvent::ExportCompleted(_) => EVENT_EXPORT_COMPLETED,
            WorkspaceEvent::ExportFailed(_) => EVENT_EXPORT_FAILED,
            WorkspaceEvent::LinkCopied { .. } => EVENT_LINK_COPIED,
            WorkspaceEvent::CodeCopied => EVENT_CODE_COPIED,
            WorkspaceEvent::ShareOpened { .. } => EVENT_SHARE_OPENED,
            WorkspaceEvent::ShareFailed { .. } => EVENT_SHARE_FAILED,
        }
    }

    /// Message shown to the user
    pub fn message(&self) -> String {
        match self {
            WorkspaceEvent::ProjectLoaded { .. } => "Project loaded.".to_string(),
            WorkspaceEvent::ProjectLoadFailed(p) => format!("Failed to load project: {}", p.error),
            WorkspaceEvent::RequirementsUploaded { characters, .. } => {
                format!("Imported {} characters of requirements.", characters)
            }
            WorkspaceEvent::UploadFailed(p) => format!("Failed to upload file: {}", p.error),
            WorkspaceEvent::AnalysisStarted { .. } => "Analyzing Architecture...".to_string(),
            WorkspaceEvent::AnalysisSucceeded(p) => format!(
                "Generated {} diagram with {} pattern suggestion(s).",
                p.diagram_type, p.pattern_count
            ),
            WorkspaceEvent::AnalysisFailed(p) => {
                format!("Architecture Analysis Failed: {}", p.error)
            }
            WorkspaceEvent::ExportCompleted(p) => format!("Exported {}.", p.file_name),
            WorkspaceEvent::ExportFailed(p) => format!("Failed to export diagram: {}", p.error),
            WorkspaceEvent::LinkCopied { .. } => "Project link copied to clipboard!".to_string(),
            WorkspaceEvent::CodeCopied => "Code copied to clipboard!".to_string(),
            WorkspaceEvent::ShareOpened { channel, .. } => format!("Opened {} share.", channel),
            WorkspaceEvent::ShareFailed { error } => format!("Failed to share: {}", error),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            WorkspaceEvent::ProjectLoadFailed(_)
                | WorkspaceEvent::UploadFailed(_)
                | WorkspaceEvent::AnalysisFailed(_)
                | WorkspaceEvent::ExportFailed(_)
                | WorkspaceEvent::ShareFailed { .. }
        )
    }
}

/// Optional channel the workspace reports events on.
///
/// Sending never fails the operation: a dropped receiver just means nobody is
/// listening.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<mpsc::UnboundedSender<WorkspaceEvent>>,
}

impl EventSink {
    pub fn new(sender: mpsc::UnboundedSender<WorkspaceEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A sink that drops everything
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: WorkspaceEvent) {
        if event.is_failure() {
            log::warn!("{}: {}", event.name(), event.message());
        } else {
            log::info!("{}: {}", event.name(), event.message());
        }
        if let Some(ref sender) = self.sender {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_name_tag() {
        let event = WorkspaceEvent::AnalysisFailed(FailurePayload {
            project_id: 3,
            error: "timeout".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "analysis_failed");
        assert_eq!(json["payload"]["projectId"], 3);
        assert_eq!(event.name(), EVENT_ANALYSIS_FAILED);
        assert_eq!(event.message(), "Architecture Analysis Failed: timeout");
    }

    #[test]
    fn test_sink_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(tx);
        sink.emit(WorkspaceEvent::CodeCopied);
        assert_eq!(rx.try_recv().unwrap(), WorkspaceEvent::CodeCopied);
    }

    #[test]
    fn test_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = EventSink::new(tx);
        sink.emit(WorkspaceEvent::CodeCopied);
        EventSink::disabled().emit(WorkspaceEvent::CodeCopied);
    }
}
