//! Project store and AI analysis service boundaries
//!
//! The workspace only talks to these two traits. [`http::HttpBackend`] is the
//! reqwest implementation used by the binary; tests plug in their own.

pub mod http;
pub mod session;

pub use http::HttpBackend;
pub use session::{SessionContext, UserSession};

use crate::models::{AnalysisRequest, PatternSet, Project};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure talking to the project store or the analysis service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Network failure, timeout or unreadable body
    #[error("Request failed: {0}")]
    Transport(String),

    /// Non-2xx response
    #[error("Service error ({status}): {body}")]
    Status { status: u16, body: String },

    /// 2xx response whose payload breaks the contract
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Raw analysis payload. `plant_uml` is optional here because the service can
/// answer 2xx without it; the orchestrator decides whether it is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub plant_uml: Option<String>,
    #[serde(default)]
    pub patterns: Option<PatternSet>,
}

/// Text extracted from an uploaded requirement document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub content: String,
}

/// Extensions accepted by the requirement upload
pub const ACCEPTED_UPLOAD_EXTENSIONS: &[&str] = &["txt", "md", "java", "pdf", "doc", "docx"];

/// A requirement document picked for upload
#[derive(Debug, Clone)]
pub struct RequirementDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl RequirementDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a document from disk, keeping only its file name
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "requirements.txt".to_string());
        Ok(Self { file_name, bytes })
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        PathBuf::from(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    pub fn is_accepted(&self) -> bool {
        self.extension()
            .map(|ext| ACCEPTED_UPLOAD_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

/// Persists and retrieves projects
pub trait ProjectStore: Send + Sync {
    fn fetch_project(&self, project_id: u64) -> BoxFuture<'_, Result<Project, ServiceError>>;

    fn upload_requirements<'a>(
        &'a self,
        project_id: u64,
        document: &'a RequirementDocument,
    ) -> BoxFuture<'a, Result<UploadResponse, ServiceError>>;
}

/// Turns requirement text into diagram markup and pattern annotations
pub trait AnalysisService: Send + Sync {
    fn analyze<'a>(
        &'a self,
        request: &'a AnalysisRequest,
    ) -> BoxFuture<'a, Result<AnalyzeResponse, ServiceError>>;
}
