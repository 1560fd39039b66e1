// Workspace liveness flag checked by late async completions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared liveness state of one workspace.
///
/// Cloned into every in-flight operation; a completion that finds the flag
/// cleared must drop its result without touching workspace state.
#[derive(Debug, Clone)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mark the workspace as torn down
    pub fn dispose(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            log::info!("Workspace disposed");
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}
