// Analysis state machine with validated transitions

use super::AnalysisRequest;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Invalid analysis transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

/// Lifecycle of the single analysis a workspace may run.
///
/// `Succeeded` and `Failed` accept a new submit just like `Idle`; only
/// `Submitting` blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Submitting {
        request: AnalysisRequest,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        revision: u64,
    },
    Failed {
        reason: String,
    },
}

impl AnalysisState {
    pub fn name(&self) -> &'static str {
        match self {
            AnalysisState::Idle => "idle",
            AnalysisState::Submitting { .. } => "submitting",
            AnalysisState::Succeeded { .. } => "succeeded",
            AnalysisState::Failed { .. } => "failed",
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, AnalysisState::Submitting { .. })
    }

    /// Whether a new submit may start from this state
    pub fn accepts_submit(&self) -> bool {
        !self.is_submitting()
    }

    /// Failure reason, if the last analysis failed
    pub fn failure(&self) -> Option<&str> {
        match self {
            AnalysisState::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

impl Default for AnalysisState {
    fn default() -> Self {
        AnalysisState::Idle
    }
}

/// Validates if the analysis can move from one state to another
pub fn can_transition(from: &AnalysisState, to: &AnalysisState) -> bool {
    use AnalysisState::*;
    matches!(
        (from, to),
        (Idle, Submitting { .. })
            | (Succeeded { .. }, Submitting { .. })
            | (Failed { .. }, Submitting { .. })
            | (Submitting { .. }, Succeeded { .. })
            | (Submitting { .. }, Failed { .. })
            | (Succeeded { .. }, Idle)
            | (Failed { .. }, Idle)
            | (Idle, Idle)
    )
}

/// Validates and performs a transition, returning the new state
pub fn transition_state(
    current: &AnalysisState,
    target: AnalysisState,
) -> Result<AnalysisState, StateTransitionError> {
    if !can_transition(current, &target) {
        return Err(StateTransitionError::InvalidTransition {
            from: current.name(),
            to: target.name(),
        });
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiagramType;

    fn submitting() -> AnalysisState {
        AnalysisState::Submitting {
            request: AnalysisRequest {
                project_id: 1,
                requirements: "Users place orders".to_string(),
                diagram_type: DiagramType::Class,
            },
            started_at: Utc::now(),
        }
    }

    #[test]
    fn test_idle_to_submitting() {
        let result = transition_state(&AnalysisState::Idle, submitting());
        assert!(result.is_ok());
        assert!(result.unwrap().is_submitting());
    }

    #[test]
    fn test_submitting_resolves_either_way() {
        assert!(can_transition(
            &submitting(),
            &AnalysisState::Succeeded { revision: 1 }
        ));
        assert!(can_transition(
            &submitting(),
            &AnalysisState::Failed {
                reason: "timeout".into()
            }
        ));
    }

    #[test]
    fn test_submitting_cannot_restart() {
        assert!(!can_transition(&submitting(), &submitting()));
        assert!(!submitting().accepts_submit());
        let err = transition_state(&submitting(), submitting()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid analysis transition from submitting to submitting"
        );
    }

    #[test]
    fn test_submitting_cannot_go_idle_directly() {
        assert!(!can_transition(&submitting(), &AnalysisState::Idle));
    }

    #[test]
    fn test_finished_states_accept_submit() {
        let failed = AnalysisState::Failed {
            reason: "boom".into(),
        };
        let succeeded = AnalysisState::Succeeded { revision: 3 };
        assert!(failed.accepts_submit());
        assert!(succeeded.accepts_submit());
        assert!(can_transition(&failed, &submitting()));
        assert!(can_transition(&succeeded, &submitting()));
        assert_eq!(failed.failure(), Some("boom"));
    }

    #[test]
    fn test_idle_cannot_finish_without_submitting() {
        assert!(!can_transition(
            &AnalysisState::Idle,
            &AnalysisState::Succeeded { revision: 1 }
        ));
        assert!(!can_transition(
            &AnalysisState::Idle,
            &AnalysisState::Failed {
                reason: "x".into()
            }
        ));
    }
}
