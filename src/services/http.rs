// reqwest binding of the project store and analysis service

use super::{
    AnalysisService, AnalyzeResponse, ProjectStore, RequirementDocument, ServiceError,
    SessionContext, UploadResponse,
};
use crate::config::ApiConfig;
use crate::models::{AnalysisRequest, Project};
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Body of `POST /projects/{id}/analyze`
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody<'a> {
    requirements: &'a str,
    diagram_type: &'a str,
}

/// HTTP client for the backend's `/projects` API
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl HttpBackend {
    /// Create a backend from the `[api]` config section
    pub fn new(config: &ApiConfig, session: SessionContext) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("aiuml/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn project_url(&self, project_id: u64, suffix: &str) -> String {
        format!("{}/projects/{}{}", self.base_url, project_id, suffix)
    }

    /// Attach the bearer token when a session is active
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.authorization_header() {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, ServiceError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(format!("Failed to {}: {}", what, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            log::warn!("Backend returned {} while trying to {}", status, what);
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ServiceError::Malformed(format!("Failed to parse response: {}", e)))
    }
}

impl ProjectStore for HttpBackend {
    fn fetch_project(&self, project_id: u64) -> BoxFuture<'_, Result<Project, ServiceError>> {
        Box::pin(async move {
            let url = self.project_url(project_id, "");
            log::debug!("GET {}", url);
            self.send_json(self.client.get(&url), "load project").await
        })
    }

    fn upload_requirements<'a>(
        &'a self,
        project_id: u64,
        document: &'a RequirementDocument,
    ) -> BoxFuture<'a, Result<UploadResponse, ServiceError>> {
        Box::pin(async move {
            let url = self.project_url(project_id, "/upload");
            log::debug!("POST {} ({})", url, document.file_name);

            let part = reqwest::multipart::Part::bytes(document.bytes.clone())
                .file_name(document.file_name.clone());
            let form = reqwest::multipart::Form::new().part("file", part);

            self.send_json(self.client.post(&url).multipart(form), "upload document").await
        })
    }
}

impl AnalysisService for HttpBackend {
    fn analyze<'a>(
        &'a self,
        request: &'a AnalysisRequest,
    ) -> BoxFuture<'a, Result<AnalyzeResponse, ServiceError>> {
        Box::pin(async move {
            let url = self.project_url(request.project_id, "/analyze");
            log::debug!("POST {} ({})", url, request.diagram_type);

            let body = AnalyzeBody {
                requirements: &request.requirements,
                diagram_type: request.diagram_type.as_str(),
            };

            self.send_json(self.client.post(&url).json(&body), "analyze project").await
        })
    }
}
