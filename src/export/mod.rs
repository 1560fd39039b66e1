//! Diagram export pipeline
//!
//! Turns the mounted diagram surface into a downloadable file. Capture and
//! PDF assembly are delegated to the rasterization library through
//! [`SurfaceCapture`] and [`PdfComposer`]; delivery goes through a
//! [`DownloadSink`].
//!
//! Format handling:
//! - PNG / JPG: raster capture at a high pixel density (JPG at max quality)
//! - SVG: vector capture straight from the surface, no pixel density
//! - PDF: PNG capture embedded in a single page sized exactly to the surface

mod pipeline;
mod sink;

pub use pipeline::{ExportPipeline, ExportReceipt};
pub use sink::DirectoryDownloadSink;

use crate::config::ExportConfig;
use crate::models::ExportFormat;
use crate::render::SurfaceHandle;
use futures_util::future::BoxFuture;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    /// No current artifact, or its surface is not mounted
    #[error("Nothing to export: generate a diagram and open the diagram view first")]
    NothingToExport,

    #[error("Another export is already running")]
    Busy,

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("PDF assembly failed: {0}")]
    Compose(String),

    #[error("Download failed: {0}")]
    Delivery(String),
}

/// What the capture library is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Png,
    Jpeg,
    Svg,
}

/// Options passed with every capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    /// Opaque canvas color painted behind the diagram
    pub background_color: String,
    /// Device pixel multiplier; `None` for vector captures
    pub pixel_ratio: Option<f32>,
    /// Encoder quality in (0, 1]; JPEG only
    pub quality: Option<f32>,
}

/// Converts a live surface into image bytes. Captures read the surface and
/// must never be run twice at once against it.
pub trait SurfaceCapture: Send + Sync {
    fn capture<'a>(
        &'a self,
        surface: &'a SurfaceHandle,
        kind: CaptureKind,
        options: &'a CaptureOptions,
    ) -> BoxFuture<'a, Result<Vec<u8>, String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfOrientation {
    Landscape,
    Portrait,
}

/// Page geometry of a PDF export, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPage {
    pub width: f64,
    pub height: f64,
    pub orientation: PdfOrientation,
}

impl PdfPage {
    /// A page exactly the size of the surface. Wide surfaces are landscape;
    /// the dimensions are never swapped.
    pub fn for_surface(surface: &SurfaceHandle) -> Self {
        let orientation = if surface.width >= surface.height {
            PdfOrientation::Landscape
        } else {
            PdfOrientation::Portrait
        };
        Self {
            width: f64::from(surface.width),
            height: f64::from(surface.height),
            orientation,
        }
    }
}

/// Bitmap placed on the PDF page
#[derive(Debug, Clone, PartialEq)]
pub struct PdfImage {
    pub png: Vec<u8>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Builds a single-page PDF around one bitmap
pub trait PdfComposer: Send + Sync {
    fn compose(&self, page: &PdfPage, image: &PdfImage) -> Result<Vec<u8>, String>;
}

/// A finished export, ready to hand to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// `diagram-<projectId>.<ext>`
    pub fn file_name_for(project_id: u64, format: ExportFormat) -> String {
        format!("diagram-{}.{}", project_id, format.extension())
    }
}

/// Delivers a file to the user (browser download, file on disk, ...).
/// Either the whole file is delivered or nothing is.
pub trait DownloadSink: Send + Sync {
    /// Returns where the file ended up
    fn deliver(&self, file: &ExportedFile) -> Result<String, String>;
}

/// A single export request; lives only while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportJob {
    pub format: ExportFormat,
    pub surface: SurfaceHandle,
}

/// Capture parameters, resolved from the `[export]` config section
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub background_color: String,
    pub png_pixel_ratio: f32,
    pub jpeg_pixel_ratio: f32,
    pub jpeg_quality: f32,
    pub pdf_pixel_ratio: f32,
}

impl From<&ExportConfig> for ExportSettings {
    fn from(config: &ExportConfig) -> Self {
        Self {
            background_color: config.background_color.clone(),
            png_pixel_ratio: config.png_pixel_ratio,
            jpeg_pixel_ratio: config.jpeg_pixel_ratio,
            jpeg_quality: config.jpeg_quality,
            pdf_pixel_ratio: config.pdf_pixel_ratio,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl ExportSettings {
    /// Capture kind and options for a target format. PDF is captured as PNG
    /// and wrapped afterwards.
    pub fn capture_plan(&self, format: ExportFormat) -> (CaptureKind, CaptureOptions) {
        let background_color = self.background_color.clone();
        match format {
            ExportFormat::Png => (
                CaptureKind::Png,
                CaptureOptions {
                    background_color,
                    pixel_ratio: Some(self.png_pixel_ratio),
                    quality: None,
                },
            ),
            ExportFormat::Jpg => (
                CaptureKind::Jpeg,
                CaptureOptions {
                    background_color,
                    pixel_ratio: Some(self.jpeg_pixel_ratio),
                    quality: Some(self.jpeg_quality),
                },
            ),
            ExportFormat::Svg => (
                CaptureKind::Svg,
                CaptureOptions {
                    background_color,
                    pixel_ratio: None,
                    quality: None,
                },
            ),
            ExportFormat::Pdf => (
                CaptureKind::Png,
                CaptureOptions {
                    background_color,
                    pixel_ratio: Some(self.pdf_pixel_ratio),
                    quality: None,
                },
            ),
        }
    }
}
