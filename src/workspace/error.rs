// Workspace error taxonomy

use crate::export::ExportError;
use crate::models::StateTransitionError;
use crate::services::ServiceError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    /// Rejected locally before any service call
    #[error("{0}")]
    Input(String),

    #[error("An analysis is already running")]
    Busy,

    #[error("{0}")]
    Service(ServiceError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Share failed: {0}")]
    ShareDispatch(String),

    #[error("Unknown diagram type: '{0}'. Expected one of: CLASS, USECASE, SEQUENCE")]
    InvalidDiagramType(String),

    /// The workspace was torn down while the operation was in flight
    #[error("Workspace was closed before the operation finished")]
    Disposed,
}

impl From<ServiceError> for WorkspaceError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Malformed(message) => WorkspaceError::MalformedResponse(message),
            other => WorkspaceError::Service(other),
        }
    }
}

impl From<StateTransitionError> for WorkspaceError {
    // Only reachable when a submit races another one
    fn from(_: StateTransitionError) -> Self {
        WorkspaceError::Busy
    }
}
