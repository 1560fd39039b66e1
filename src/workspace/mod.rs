//! Project workspace
//!
//! One open project: requirement editing, a single-flight analysis, the
//! diagram/code/patterns views, export and share. All user-visible outcomes
//! are reported through the [`EventSink`] as well as returned.
//!
//! Surface lifecycle: the rendering engine's surface is mounted while the
//! panel shows the diagram view of a current artifact. It is released when
//! the view changes away, when an analysis starts, when a newer artifact
//! replaces it, or on dispose. A surface an export is still reading from is
//! released only once that export ends.

mod error;
pub mod orchestrator;
pub mod requirements;
pub mod view;

pub use error::WorkspaceError;
pub use orchestrator::{AnalysisOrchestrator, Submission};
pub use requirements::{RequirementSeed, RequirementStore};
pub use view::{DiagramViewState, PanZoom, Panel, View};

use crate::config::AppConfig;
use crate::events::{
    AnalysisSucceededPayload, EventSink, ExportCompletedPayload, FailurePayload, WorkspaceEvent,
};
use crate::export::{
    DownloadSink, ExportError, ExportPipeline, ExportReceipt, ExportSettings, PdfComposer,
    SurfaceCapture,
};
use crate::lifetime::Liveness;
use crate::models::{
    AnalysisState, CurrentDiagram, DiagramArtifact, DiagramType, ExportFormat, PatternSet,
    PatternSuggestion, Project, ShareChannel, ShareTarget,
};
use crate::render::{RenderError, RenderingEngine, SurfaceHandle};
use crate::services::{AnalysisService, ProjectStore, RequirementDocument};
use crate::share::{Clipboard, LinkLauncher, ShareController};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Capabilities a workspace is built from. Hosts without a display leave
/// `capture` and `composer` unset.
#[derive(Clone)]
pub struct WorkspaceDeps {
    pub store: Arc<dyn ProjectStore>,
    pub analysis: Arc<dyn AnalysisService>,
    pub renderer: Arc<dyn RenderingEngine>,
    pub capture: Option<Arc<dyn SurfaceCapture>>,
    pub composer: Option<Arc<dyn PdfComposer>>,
    pub downloads: Arc<dyn DownloadSink>,
    pub clipboard: Arc<dyn Clipboard>,
    pub launcher: Arc<dyn LinkLauncher>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MountedSurface {
    revision: u64,
    handle: SurfaceHandle,
}

#[derive(Debug, Default)]
struct Display {
    view: DiagramViewState,
    mounted: Option<MountedSurface>,
    /// Surface the running export reads from
    exporting: Option<SurfaceHandle>,
    /// Taken off screen while still being exported
    deferred_release: Vec<SurfaceHandle>,
}

pub struct Workspace {
    project_id: u64,
    store: Arc<dyn ProjectStore>,
    renderer: Arc<dyn RenderingEngine>,
    requirements: Mutex<RequirementStore>,
    orchestrator: AnalysisOrchestrator,
    display: Mutex<Display>,
    exporter: ExportPipeline,
    share: ShareController,
    export_modal_open: AtomicBool,
    events: EventSink,
    liveness: Liveness,
}

/// Marks the mounted surface as being exported; ends the export however the
/// caller's future finishes
struct ExportLease<'a> {
    workspace: &'a Workspace,
}

impl Drop for ExportLease<'_> {
    fn drop(&mut self) {
        let deferred = {
            let mut display = self.workspace.lock_display();
            display.exporting = None;
            std::mem::take(&mut display.deferred_release)
        };
        for handle in deferred {
            log::debug!("Releasing surface {} after export", handle.id);
            self.workspace.renderer.release(handle);
        }
    }
}

/// Re-syncs the surface when an analysis ends, including when the caller
/// drops the analysis future before it completes
struct SurfaceResync<'a> {
    workspace: &'a Workspace,
}

impl Drop for SurfaceResync<'_> {
    fn drop(&mut self) {
        self.workspace.sync_surface();
    }
}

impl Workspace {
    pub fn new(project_id: u64, config: &AppConfig, deps: WorkspaceDeps, events: EventSink) -> Self {
        let liveness = Liveness::new();
        Self {
            project_id,
            store: deps.store,
            renderer: deps.renderer,
            requirements: Mutex::new(RequirementStore::new()),
            orchestrator: AnalysisOrchestrator::new(deps.analysis, liveness.clone()),
            display: Mutex::new(Display::default()),
            exporter: ExportPipeline::new(
                deps.capture,
                deps.composer,
                deps.downloads,
                ExportSettings::from(&config.export),
            ),
            share: ShareController::new(
                project_id,
                config.share.clone(),
                deps.clipboard,
                deps.launcher,
            ),
            export_modal_open: AtomicBool::new(false),
            events,
            liveness,
        }
    }

    fn lock_requirements(&self) -> MutexGuard<'_, RequirementStore> {
        self.requirements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_display(&self) -> MutexGuard<'_, Display> {
        self.display.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn failure(&self, error: &WorkspaceError) -> FailurePayload {
        FailurePayload {
            project_id: self.project_id,
            error: error.to_string(),
        }
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    // Requirements

    /// Pre-fill the requirements (template hand-off)
    pub fn seed(&self, seed: &RequirementSeed) {
        self.lock_requirements().load(seed);
    }

    pub fn requirement_text(&self) -> String {
        self.lock_requirements().text().to_string()
    }

    pub fn set_requirements(&self, text: impl Into<String>) {
        self.lock_requirements().set_text(text);
    }

    pub fn diagram_type(&self) -> DiagramType {
        self.lock_requirements().diagram_type()
    }

    pub fn set_diagram_type(&self, value: &str) -> Result<DiagramType, WorkspaceError> {
        self.lock_requirements().set_diagram_type(value)
    }

    pub fn select_diagram_type(&self, diagram_type: DiagramType) {
        self.lock_requirements().select(diagram_type);
    }

    /// Fetch the project and restore its requirements and last diagram
    pub async fn load(&self) -> Result<Project, WorkspaceError> {
        let result = self.store.fetch_project(self.project_id).await;
        if !self.liveness.is_alive() {
            log::info!("Discarding project {} load: workspace closed", self.project_id);
            return Err(WorkspaceError::Disposed);
        }

        let project = match result {
            Ok(project) => project,
            Err(e) => {
                let error = WorkspaceError::from(e);
                self.events
                    .emit(WorkspaceEvent::ProjectLoadFailed(self.failure(&error)));
                return Err(error);
            }
        };

        self.lock_requirements().apply_project(&project);

        let stored = project
            .latest_diagram()
            .and_then(|d| {
                d.plant_uml_code
                    .as_deref()
                    .filter(|m| !m.trim().is_empty())
                    .map(|markup| (d.diagram_type.as_deref(), markup))
            });
        if let Some((stored_type, markup)) = stored {
            let diagram_type = stored_type
                .and_then(|t| t.parse::<DiagramType>().ok())
                .unwrap_or_else(|| self.diagram_type());
            let patterns = PatternSet::from(project.pattern_suggestions.clone());
            if self
                .orchestrator
                .publish_restored(DiagramArtifact::new(diagram_type, markup), patterns)
                .is_some()
            {
                self.lock_display().view.on_artifact_accepted();
            }
        }

        self.sync_surface();
        self.events.emit(WorkspaceEvent::ProjectLoaded {
            project_id: self.project_id,
        });
        Ok(project)
    }

    /// Upload a requirement document; its extracted text replaces the
    /// requirements
    pub async fn upload_requirements(
        &self,
        document: &RequirementDocument,
    ) -> Result<String, WorkspaceError> {
        if !document.is_accepted() {
            let error = WorkspaceError::Input(format!(
                "Unsupported file type: {}. Accepted: .txt, .md, .java, .pdf, .doc, .docx",
                document.file_name
            ));
            self.events
                .emit(WorkspaceEvent::UploadFailed(self.failure(&error)));
            return Err(error);
        }

        log::info!(
            "Uploading {} ({} bytes) for project {}",
            document.file_name,
            document.bytes.len(),
            self.project_id
        );
        let result = self
            .store
            .upload_requirements(self.project_id, document)
            .await;
        if !self.liveness.is_alive() {
            log::info!("Discarding upload for project {}: workspace closed", self.project_id);
            return Err(WorkspaceError::Disposed);
        }

        match result {
            Ok(response) => {
                let characters = response.content.chars().count();
                self.lock_requirements().set_text(response.content.clone());
                self.events.emit(WorkspaceEvent::RequirementsUploaded {
                    project_id: self.project_id,
                    characters,
                });
                Ok(response.content)
            }
            Err(e) => {
                let error = WorkspaceError::from(e);
                self.events
                    .emit(WorkspaceEvent::UploadFailed(self.failure(&error)));
                Err(error)
            }
        }
    }

    // Analysis

    /// Analyze the current requirements with the selected diagram type
    pub async fn analyze(&self) -> Result<CurrentDiagram, WorkspaceError> {
        let (text, diagram_type) = {
            let requirements = self.lock_requirements();
            (requirements.text().to_string(), requirements.diagram_type())
        };

        let submission = match self.orchestrator.begin(self.project_id, &text, diagram_type) {
            Ok(submission) => submission,
            Err(error) => {
                if matches!(error, WorkspaceError::Input(_)) {
                    self.events
                        .emit(WorkspaceEvent::AnalysisFailed(self.failure(&error)));
                }
                return Err(error);
            }
        };

        self.events.emit(WorkspaceEvent::AnalysisStarted {
            project_id: self.project_id,
        });
        self.sync_surface();
        // Declared before the run future so it drops after the submission
        let _resync = SurfaceResync { workspace: self };

        match submission.run().await {
            Ok(current) => {
                self.lock_display().view.on_artifact_accepted();
                self.sync_surface();
                self.events
                    .emit(WorkspaceEvent::AnalysisSucceeded(AnalysisSucceededPayload {
                        project_id: self.project_id,
                        revision: current.revision,
                        diagram_type: current.artifact.diagram_type.to_string(),
                        pattern_count: current.patterns.len(),
                    }));
                Ok(current)
            }
            Err(WorkspaceError::Disposed) => Err(WorkspaceError::Disposed),
            Err(error) => {
                self.sync_surface();
                self.events
                    .emit(WorkspaceEvent::AnalysisFailed(self.failure(&error)));
                Err(error)
            }
        }
    }

    pub fn analysis_state(&self) -> AnalysisState {
        self.orchestrator.state()
    }

    pub fn current(&self) -> Option<CurrentDiagram> {
        self.orchestrator.current()
    }

    /// One card per pattern of the current artifact
    pub fn pattern_cards(&self) -> Vec<PatternSuggestion> {
        self.current()
            .map(|c| c.patterns.cards())
            .unwrap_or_default()
    }

    // View

    pub fn panel(&self) -> Panel {
        let submitting = self.orchestrator.is_submitting();
        let has_artifact = self.orchestrator.current().is_some();
        let view = self.lock_display().view.view();
        Panel::resolve(submitting, has_artifact, view)
    }

    pub fn view(&self) -> View {
        self.lock_display().view.view()
    }

    pub fn set_view(&self, view: View) {
        self.lock_display().view.set_view(view);
        self.sync_surface();
    }

    pub fn transform(&self) -> PanZoom {
        self.lock_display().view.transform()
    }

    pub fn pan(&self, dx: f64, dy: f64) {
        self.lock_display().view.transform_mut().pan(dx, dy);
    }

    pub fn zoom_in(&self) {
        self.lock_display().view.transform_mut().zoom_in();
    }

    pub fn zoom_out(&self) {
        self.lock_display().view.transform_mut().zoom_out();
    }

    pub fn reset_transform(&self) {
        self.lock_display().view.transform_mut().reset();
    }

    /// The surface currently on screen, if any
    pub fn mounted_surface(&self) -> Option<SurfaceHandle> {
        self.lock_display().mounted.map(|m| m.handle)
    }

    fn release_or_defer(&self, display: &mut Display, handle: SurfaceHandle) {
        if display.exporting == Some(handle) {
            display.deferred_release.push(handle);
        } else {
            self.renderer.release(handle);
        }
    }

    /// Mount or release the surface so it matches what the panel shows
    fn sync_surface(&self) {
        let current = self.orchestrator.current();
        let submitting = self.orchestrator.is_submitting();

        let mut display = self.lock_display();
        let panel = Panel::resolve(submitting, current.is_some(), display.view.view());
        let wanted = if panel.shows_surface() && self.liveness.is_alive() {
            current
        } else {
            None
        };

        if display.mounted.map(|m| m.revision) == wanted.as_ref().map(|c| c.revision) {
            return;
        }
        if let Some(old) = display.mounted.take() {
            self.release_or_defer(&mut display, old.handle);
        }

        let Some(current) = wanted else {
            return;
        };
        match self.renderer.render(&current.artifact.markup) {
            Ok(handle) => {
                log::debug!(
                    "Mounted surface {} ({}x{}) for revision {}",
                    handle.id,
                    handle.width,
                    handle.height,
                    current.revision
                );
                display.mounted = Some(MountedSurface {
                    revision: current.revision,
                    handle,
                });
            }
            Err(RenderError::Unavailable) => {
                log::debug!("No rendering surface available for project {}", self.project_id);
            }
            Err(e) => {
                log::warn!("Failed to render diagram for project {}: {}", self.project_id, e);
            }
        }
    }

    // Export

    pub fn open_export_modal(&self) {
        self.export_modal_open.store(true, Ordering::SeqCst);
    }

    pub fn close_export_modal(&self) {
        self.export_modal_open.store(false, Ordering::SeqCst);
    }

    pub fn is_export_modal_open(&self) -> bool {
        self.export_modal_open.load(Ordering::SeqCst)
    }

    pub fn is_exporting(&self) -> bool {
        self.exporter.is_busy() || self.lock_display().exporting.is_some()
    }

    /// Export the mounted diagram. Closes the export modal when done.
    pub async fn export(&self, format: ExportFormat) -> Result<ExportReceipt, WorkspaceError> {
        let has_artifact = self.orchestrator.current().is_some();
        let (surface, lease) = {
            let mut display = self.lock_display();
            if display.exporting.is_some() {
                log::warn!("Export for project {} rejected: already running", self.project_id);
                return Err(ExportError::Busy.into());
            }
            let surface = if has_artifact {
                display.mounted.map(|m| m.handle)
            } else {
                None
            };
            display.exporting = surface;
            (surface, ExportLease { workspace: self })
        };

        let result = self.exporter.export(self.project_id, surface, format).await;
        drop(lease);

        if !matches!(result, Err(ExportError::Busy)) {
            self.close_export_modal();
        }

        match result {
            Ok(receipt) => {
                self.events
                    .emit(WorkspaceEvent::ExportCompleted(ExportCompletedPayload {
                        project_id: self.project_id,
                        file_name: receipt.file_name.clone(),
                        mime_type: receipt.mime_type.clone(),
                        size_bytes: receipt.size_bytes,
                    }));
                Ok(receipt)
            }
            Err(e) => {
                let error = WorkspaceError::from(e);
                self.events
                    .emit(WorkspaceEvent::ExportFailed(self.failure(&error)));
                Err(error)
            }
        }
    }

    // Share

    pub fn share(&self) -> &ShareController {
        &self.share
    }

    pub fn share_url(&self) -> String {
        self.share.share_url()
    }

    /// Copy the project link to the clipboard
    pub async fn copy_link(&self) -> Result<ShareTarget, WorkspaceError> {
        match self.share.copy_to_clipboard().await {
            Ok(target) => {
                self.events.emit(WorkspaceEvent::LinkCopied {
                    url: target.url.clone(),
                });
                Ok(target)
            }
            Err(e) => Err(self.share_failed(e)),
        }
    }

    /// Share the project link through a channel
    pub async fn share_via(&self, channel: ShareChannel) -> Result<ShareTarget, WorkspaceError> {
        if channel == ShareChannel::Clipboard {
            return self.copy_link().await;
        }
        match self.share.share_via(channel).await {
            Ok(target) => {
                self.events.emit(WorkspaceEvent::ShareOpened {
                    channel: channel.to_string(),
                    url: target.url.clone(),
                });
                Ok(target)
            }
            Err(e) => Err(self.share_failed(e)),
        }
    }

    /// Copy the current diagram markup ("Copy Code")
    pub async fn copy_code(&self) -> Result<(), WorkspaceError> {
        let current = self
            .current()
            .ok_or_else(|| WorkspaceError::Input("No diagram code to copy yet.".to_string()))?;
        match self.share.copy_text(&current.artifact.markup).await {
            Ok(()) => {
                self.events.emit(WorkspaceEvent::CodeCopied);
                Ok(())
            }
            Err(e) => Err(self.share_failed(e)),
        }
    }

    fn share_failed(&self, message: String) -> WorkspaceError {
        let error = WorkspaceError::ShareDispatch(message);
        self.events.emit(WorkspaceEvent::ShareFailed {
            error: error.to_string(),
        });
        error
    }

    // Lifetime

    /// Tear the workspace down. In-flight loads, uploads and analyses finish
    /// with [`WorkspaceError::Disposed`] and leave state untouched.
    pub fn dispose(&self) {
        self.liveness.dispose();
        let mut display = self.lock_display();
        if let Some(mounted) = display.mounted.take() {
            self.release_or_defer(&mut display, mounted.handle);
        }
    }

    pub fn is_disposed(&self) -> bool {
        !self.liveness.is_alive()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.dispose();
    }
}
