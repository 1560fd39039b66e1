// Analysis orchestrator: one submit at a time, atomic artifact publication

use super::WorkspaceError;
use crate::lifetime::Liveness;
use crate::models::state_machine::transition_state;
use crate::models::{
    AnalysisRequest, AnalysisState, CurrentDiagram, DiagramArtifact, DiagramType, PatternSet,
};
use crate::services::{AnalysisService, AnalyzeResponse};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    state: AnalysisState,
    current: Option<CurrentDiagram>,
    revision: u64,
}

/// Owns the analysis state and the current artifact/pattern pair.
///
/// Both live behind one lock so a reader never sees an artifact with the
/// previous analysis' patterns. The lock is never held across the service
/// call.
pub struct AnalysisOrchestrator {
    service: Arc<dyn AnalysisService>,
    liveness: Liveness,
    inner: Mutex<Inner>,
}

/// An accepted submit waiting for its service call.
///
/// Dropping it before [`Submission::run`] finishes marks the analysis as
/// failed, so the orchestrator never stays stuck in `Submitting`.
pub struct Submission<'a> {
    orchestrator: &'a AnalysisOrchestrator,
    request: AnalysisRequest,
    settled: bool,
}

impl AnalysisOrchestrator {
    pub fn new(service: Arc<dyn AnalysisService>, liveness: Liveness) -> Self {
        Self {
            service,
            liveness,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> AnalysisState {
        self.lock().state.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().state.is_submitting()
    }

    /// Snapshot of the published artifact and its patterns
    pub fn current(&self) -> Option<CurrentDiagram> {
        self.lock().current.clone()
    }

    /// Validate input and move to `Submitting`. No service call is made yet.
    pub fn begin(
        &self,
        project_id: u64,
        text: &str,
        diagram_type: DiagramType,
    ) -> Result<Submission<'_>, WorkspaceError> {
        if text.trim().is_empty() {
            return Err(WorkspaceError::Input(
                "Please enter requirements first.".to_string(),
            ));
        }
        if !self.liveness.is_alive() {
            return Err(WorkspaceError::Disposed);
        }

        let request = AnalysisRequest {
            project_id,
            requirements: text.to_string(),
            diagram_type,
        };

        let mut inner = self.lock();
        if inner.state.is_submitting() {
            log::warn!("Analysis for project {} rejected: already running", project_id);
            return Err(WorkspaceError::Busy);
        }
        inner.state = transition_state(
            &inner.state,
            AnalysisState::Submitting {
                request: request.clone(),
                started_at: Utc::now(),
            },
        )?;
        drop(inner);

        log::info!(
            "Submitting {} analysis for project {} ({} chars)",
            diagram_type,
            project_id,
            text.len()
        );
        Ok(Submission {
            orchestrator: self,
            request,
            settled: false,
        })
    }

    /// Submit and wait for the result
    pub async fn submit(
        &self,
        project_id: u64,
        text: &str,
        diagram_type: DiagramType,
    ) -> Result<CurrentDiagram, WorkspaceError> {
        self.begin(project_id, text, diagram_type)?.run().await
    }

    /// Publish a diagram restored from the project store.
    ///
    /// Skipped when an analysis already published something or is running,
    /// since that result is newer than what was persisted.
    pub fn publish_restored(
        &self,
        artifact: DiagramArtifact,
        patterns: PatternSet,
    ) -> Option<CurrentDiagram> {
        let mut inner = self.lock();
        if inner.current.is_some() || inner.state.is_submitting() {
            log::debug!("Keeping newer diagram over the stored one");
            return None;
        }
        inner.revision += 1;
        let current = CurrentDiagram {
            artifact: Arc::new(artifact),
            patterns: Arc::new(patterns),
            revision: inner.revision,
        };
        inner.current = Some(current.clone());
        Some(current)
    }

    /// Forget the outcome of the last analysis (`Succeeded|Failed -> Idle`)
    pub fn acknowledge(&self) {
        let mut inner = self.lock();
        if let Ok(next) = transition_state(&inner.state, AnalysisState::Idle) {
            inner.state = next;
        }
    }

    fn accept(
        response: AnalyzeResponse,
        diagram_type: DiagramType,
    ) -> Result<(DiagramArtifact, PatternSet), WorkspaceError> {
        let markup = response
            .plant_uml
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| {
                WorkspaceError::MalformedResponse(
                    "response did not include diagram markup".to_string(),
                )
            })?;
        Ok((
            DiagramArtifact::new(diagram_type, markup),
            response.patterns.unwrap_or_default(),
        ))
    }

    fn settle(
        &self,
        outcome: Result<(DiagramArtifact, PatternSet), WorkspaceError>,
    ) -> Result<CurrentDiagram, WorkspaceError> {
        let mut inner = self.lock();
        match outcome {
            Ok((artifact, patterns)) => {
                let revision = inner.revision + 1;
                inner.state =
                    transition_state(&inner.state, AnalysisState::Succeeded { revision })?;
                inner.revision = revision;
                let current = CurrentDiagram {
                    artifact: Arc::new(artifact),
                    patterns: Arc::new(patterns),
                    revision,
                };
                inner.current = Some(current.clone());
                Ok(current)
            }
            Err(error) => {
                inner.state = transition_state(
                    &inner.state,
                    AnalysisState::Failed {
                        reason: error.to_string(),
                    },
                )?;
                Err(error)
            }
        }
    }
}

impl Submission<'_> {
    pub fn request(&self) -> &AnalysisRequest {
        &self.request
    }

    /// Call the analysis service and publish the result
    pub async fn run(mut self) -> Result<CurrentDiagram, WorkspaceError> {
        let orchestrator = self.orchestrator;
        let outcome = orchestrator.service.analyze(&self.request).await;
        self.settled = true;

        if !orchestrator.liveness.is_alive() {
            log::info!(
                "Discarding analysis result for project {}: workspace closed",
                self.request.project_id
            );
            return Err(WorkspaceError::Disposed);
        }

        let accepted = outcome
            .map_err(WorkspaceError::from)
            .and_then(|response| AnalysisOrchestrator::accept(response, self.request.diagram_type));

        let result = orchestrator.settle(accepted);
        match result {
            Ok(ref current) => log::info!(
                "Analysis for project {} succeeded (revision {}, {} patterns)",
                self.request.project_id,
                current.revision,
                current.patterns.len()
            ),
            Err(ref e) => log::error!(
                "Analysis for project {} failed: {}",
                self.request.project_id,
                e
            ),
        }
        result
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = self.orchestrator.lock();
        if inner.state.is_submitting() {
            log::warn!(
                "Analysis for project {} was abandoned",
                self.request.project_id
            );
            inner.state = AnalysisState::Failed {
                reason: "Analysis cancelled".to_string(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedService {
        calls: AtomicUsize,
        response: Result<AnalyzeResponse, ServiceError>,
    }

    impl ScriptedService {
        fn ok(markup: Option<&str>, patterns: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Ok(AnalyzeResponse {
                    plant_uml: markup.map(str::to_string),
                    patterns: Some(
                        patterns
                            .iter()
                            .map(|(k, v)| (k.to_string(), v.to_string()))
                            .collect(),
                    ),
                }),
            })
        }

        fn failing(error: ServiceError) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Err(error),
            })
        }
    }

    impl AnalysisService for ScriptedService {
        fn analyze<'a>(
            &'a self,
            _request: &'a AnalysisRequest,
        ) -> BoxFuture<'a, Result<AnalyzeResponse, ServiceError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    #[tokio::test]
    async fn test_blank_input_makes_no_call() {
        let service = ScriptedService::ok(Some("classDiagram"), &[]);
        let orchestrator = AnalysisOrchestrator::new(service.clone(), Liveness::new());

        let result = orchestrator.submit(1, "  \n\t ", DiagramType::Class).await;
        assert!(matches!(result, Err(WorkspaceError::Input(_))));
        assert_eq!(orchestrator.state(), AnalysisState::Idle);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_publishes_exact_pair() {
        let service = ScriptedService::ok(Some("classDiagram\nA --> B"), &[("Singleton", "one db")]);
        let orchestrator = AnalysisOrchestrator::new(service, Liveness::new());

        let current = orchestrator
            .submit(1, "Users log in", DiagramType::Class)
            .await
            .unwrap();
        assert_eq!(current.artifact.markup, "classDiagram\nA --> B");
        assert_eq!(current.patterns.names(), vec!["Singleton"]);
        assert_eq!(current.revision, 1);
        assert_eq!(orchestrator.state(), AnalysisState::Succeeded { revision: 1 });
        assert_eq!(orchestrator.current(), Some(current));
    }

    #[tokio::test]
    async fn test_missing_markup_is_malformed_and_keeps_previous() {
        let orchestrator = AnalysisOrchestrator::new(
            ScriptedService::ok(None, &[("Observer", "x")]),
            Liveness::new(),
        );
        let previous = orchestrator
            .publish_restored(DiagramArtifact::new(DiagramType::Class, "old"), PatternSet::new())
            .unwrap();

        let result = orchestrator.submit(1, "text", DiagramType::Class).await;
        assert!(matches!(result, Err(WorkspaceError::MalformedResponse(_))));
        assert_eq!(orchestrator.current(), Some(previous));
        assert!(orchestrator.state().failure().is_some());
    }

    #[tokio::test]
    async fn test_service_failure_keeps_previous() {
        let orchestrator = AnalysisOrchestrator::new(
            ScriptedService::failing(ServiceError::Transport("timeout".into())),
            Liveness::new(),
        );
        let result = orchestrator.submit(1, "text", DiagramType::Class).await;
        assert_eq!(
            result,
            Err(WorkspaceError::Service(ServiceError::Transport("timeout".into())))
        );
        assert_eq!(orchestrator.current(), None);
        assert_eq!(
            orchestrator.state().failure(),
            Some("Request failed: timeout")
        );
    }

    #[tokio::test]
    async fn test_second_begin_while_submitting_is_busy() {
        let service = ScriptedService::ok(Some("classDiagram"), &[]);
        let orchestrator = AnalysisOrchestrator::new(service.clone(), Liveness::new());

        let first = orchestrator.begin(1, "text", DiagramType::Class).unwrap();
        assert!(matches!(
            orchestrator.begin(1, "text", DiagramType::Class),
            Err(WorkspaceError::Busy)
        ));
        first.run().await.unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_submission_unblocks() {
        let orchestrator = AnalysisOrchestrator::new(
            ScriptedService::ok(Some("classDiagram"), &[]),
            Liveness::new(),
        );
        let submission = orchestrator.begin(1, "text", DiagramType::Class).unwrap();
        drop(submission);
        assert!(orchestrator.state().accepts_submit());
        assert!(orchestrator.submit(1, "text", DiagramType::Class).await.is_ok());
    }

    #[tokio::test]
    async fn test_result_after_dispose_is_discarded() {
        let liveness = Liveness::new();
        let orchestrator = AnalysisOrchestrator::new(
            ScriptedService::ok(Some("classDiagram"), &[]),
            liveness.clone(),
        );
        let submission = orchestrator.begin(1, "text", DiagramType::Class).unwrap();
        liveness.dispose();

        assert_eq!(submission.run().await, Err(WorkspaceError::Disposed));
        assert_eq!(orchestrator.current(), None);
    }

    #[test]
    fn test_restored_diagram_does_not_replace_newer() {
        let orchestrator = AnalysisOrchestrator::new(
            ScriptedService::ok(Some("x"), &[]),
            Liveness::new(),
        );
        let first = orchestrator
            .publish_restored(DiagramArtifact::new(DiagramType::Class, "a"), PatternSet::new());
        assert!(first.is_some());
        let second = orchestrator
            .publish_restored(DiagramArtifact::new(DiagramType::Class, "b"), PatternSet::new());
        assert!(second.is_none());
        assert_eq!(orchestrator.current().unwrap().artifact.markup, "a");
    }

    #[test]
    fn test_acknowledge_returns_to_idle() {
        let orchestrator = AnalysisOrchestrator::new(
            ScriptedService::ok(Some("x"), &[]),
            Liveness::new(),
        );
        orchestrator.acknowledge();
        assert_eq!(orchestrator.state(), AnalysisState::Idle);
    }
}
