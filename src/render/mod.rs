//! Diagram rendering engine boundary
//!
//! The engine is opaque: the workspace hands it markup and gets back a handle
//! to whatever it drew. Only the export pipeline looks at
//! the handle's dimensions.

use thiserror::Error;

/// Reference to a rendered, on-screen diagram surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle {
    /// Engine-assigned identity
    pub id: u64,
    /// Full scroll width of the rendered diagram in CSS pixels
    pub width: u32,
    /// Full scroll height of the rendered diagram in CSS pixels
    pub height: u32,
}

impl SurfaceHandle {
    pub fn new(id: u64, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Diagram markup could not be rendered: {0}")]
    InvalidMarkup(String),

    #[error("No rendering surface available")]
    Unavailable,
}

/// Converts diagram markup into an on-screen surface
pub trait RenderingEngine: Send + Sync {
    fn render(&self, markup: &str) -> Result<SurfaceHandle, RenderError>;

    /// Detach a surface from the display
    fn release(&self, surface: SurfaceHandle);
}

/// Engine for hosts without a display (the CLI). Nothing is ever mounted, so
/// exports report "nothing to export" and no capture backend is needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessEngine;

impl RenderingEngine for HeadlessEngine {
    fn render(&self, _markup: &str) -> Result<SurfaceHandle, RenderError> {
        Err(RenderError::Unavailable)
    }

    fn release(&self, _surface: SurfaceHandle) {}
}
