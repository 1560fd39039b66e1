// Export pipeline: capture, optional PDF assembly, delivery

use super::{
    DownloadSink, ExportError, ExportJob, ExportSettings, ExportedFile, PdfComposer, PdfImage,
    PdfPage, SurfaceCapture,
};
use crate::models::ExportFormat;
use crate::render::SurfaceHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where a delivered export ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub location: String,
}

/// Runs one export at a time against the mounted surface.
///
/// A second export started while one is running is rejected with
/// [`ExportError::Busy`] instead of being queued. Hosts without a display
/// pass no capture or PDF backend.
pub struct ExportPipeline {
    capture: Option<Arc<dyn SurfaceCapture>>,
    composer: Option<Arc<dyn PdfComposer>>,
    sink: Arc<dyn DownloadSink>,
    settings: ExportSettings,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag however the export ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ExportPipeline {
    pub fn new(
        capture: Option<Arc<dyn SurfaceCapture>>,
        composer: Option<Arc<dyn PdfComposer>>,
        sink: Arc<dyn DownloadSink>,
        settings: ExportSettings,
    ) -> Self {
        Self {
            capture,
            composer,
            sink,
            settings,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Export the given surface in `format` and hand it to the download sink.
    ///
    /// `surface` is `None` when there is no current artifact or it is not
    /// mounted; nothing is captured or delivered in that case.
    pub async fn export(
        &self,
        project_id: u64,
        surface: Option<SurfaceHandle>,
        format: ExportFormat,
    ) -> Result<ExportReceipt, ExportError> {
        let surface = surface.ok_or(ExportError::NothingToExport)?;
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(ExportError::Busy)?;

        let job = ExportJob { format, surface };
        log::info!(
            "Exporting project {} as {} ({}x{})",
            project_id,
            format,
            surface.width,
            surface.height
        );

        let file = self.produce(project_id, &job).await?;
        let location = self
            .sink
            .deliver(&file)
            .map_err(ExportError::Delivery)?;

        log::info!("Exported {} ({} bytes) to {}", file.file_name, file.bytes.len(), location);
        Ok(ExportReceipt {
            size_bytes: file.bytes.len(),
            file_name: file.file_name,
            mime_type: file.mime_type,
            location,
        })
    }

    async fn produce(&self, project_id: u64, job: &ExportJob) -> Result<ExportedFile, ExportError> {
        let (kind, options) = self.settings.capture_plan(job.format);
        let capture = self
            .capture
            .as_ref()
            .ok_or_else(|| ExportError::Capture("No surface capture on this host".to_string()))?;
        let captured = capture
            .capture(&job.surface, kind, &options)
            .await
            .map_err(ExportError::Capture)?;

        let bytes = match job.format {
            ExportFormat::Pdf => {
                let page = PdfPage::for_surface(&job.surface);
                let image = PdfImage {
                    png: captured,
                    x: 0.0,
                    y: 0.0,
                    width: page.width,
                    height: page.height,
                };
                self.composer
                    .as_ref()
                    .ok_or_else(|| ExportError::Compose("No PDF composer on this host".to_string()))?
                    .compose(&page, &image)
                    .map_err(ExportError::Compose)?
            }
            _ => captured,
        };

        Ok(ExportedFile {
            file_name: ExportedFile::file_name_for(project_id, job.format),
            mime_type: job.format.mime_type(),
            bytes,
        })
    }
}
