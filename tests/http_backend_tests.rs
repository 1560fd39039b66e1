// Integration tests for the reqwest backend against a local axum server

#[cfg(test)]
mod http_backend_integration_tests {
    use aiuml_lib::config::{ApiConfig, AppConfig};
    use aiuml_lib::events::EventSink;
    use aiuml_lib::export::DirectoryDownloadSink;
    use aiuml_lib::render::HeadlessEngine;
    use aiuml_lib::services::{
        AnalysisService, HttpBackend, ProjectStore, RequirementDocument, ServiceError,
        SessionContext, UserSession,
    };
    use aiuml_lib::share::{Clipboard, LinkLauncher};
    use aiuml_lib::{AnalysisRequest, DiagramType, Workspace, WorkspaceDeps, WorkspaceError};
    use axum::extract::{Multipart, Path};
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use futures_util::future::BoxFuture;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn get_project(Path(id): Path<u64>, headers: HeaderMap) -> Response {
        if id == 404 {
            return (StatusCode::NOT_FOUND, "Project not found").into_response();
        }
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        Json(json!({
            "id": id,
            "name": "Shop",
            "description": auth,
            "requirements": "Customers place orders",
            "diagrams": [
                { "id": 1, "type": "CLASS", "plantUmlCode": "classDiagram\nclass Order" }
            ],
            "patternSuggestions": [
                { "name": "Repository", "description": "Orders are persisted behind a repository" }
            ]
        }))
        .into_response()
    }

    async fn analyze(Path(id): Path<u64>, Json(body): Json<Value>) -> Response {
        let requirements = body["requirements"].as_str().unwrap_or_default();
        if requirements == "broken" {
            return (StatusCode::OK, "<html>gateway</html>").into_response();
        }
        if requirements == "overload" {
            return (StatusCode::SERVICE_UNAVAILABLE, "model overloaded").into_response();
        }
        Json(json!({
            "plantUml": format!("{} for project {}", body["diagramType"].as_str().unwrap_or(""), id),
            "patterns": { "Observer": "notify", "Builder": "assemble", "Adapter": "wrap" }
        }))
        .into_response()
    }

    async fn upload(Path(_id): Path<u64>, mut multipart: Multipart) -> Response {
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() != Some("file") {
                continue;
            }
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap_or_default();
            return Json(json!({
                "content": format!("{}: {}", file_name, String::from_utf8_lossy(&bytes))
            }))
            .into_response();
        }
        (StatusCode::BAD_REQUEST, "missing file").into_response()
    }

    async fn start_server() -> String {
        let app = Router::new()
            .route("/api/projects/:id", get(get_project))
            .route("/api/projects/:id/analyze", post(analyze))
            .route("/api/projects/:id/upload", post(upload));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/", addr)
    }

    fn backend(base_url: &str, session: SessionContext) -> HttpBackend {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        };
        HttpBackend::new(&config, session).unwrap()
    }

    fn signed_in(token: &str) -> SessionContext {
        SessionContext::with_session(UserSession {
            id: 1,
            email: Some("dev@example.com".into()),
            name: None,
            token: token.into(),
        })
    }

    #[tokio::test]
    async fn test_fetch_project_sends_bearer_token() {
        let base = start_server().await;
        let backend = backend(&base, signed_in("secret-token"));

        let project = backend.fetch_project(8).await.unwrap();

        assert_eq!(project.id, 8);
        assert_eq!(project.description.as_deref(), Some("Bearer secret-token"));
        assert_eq!(
            project.latest_diagram().unwrap().plant_uml_code.as_deref(),
            Some("classDiagram\nclass Order")
        );
        assert_eq!(project.pattern_suggestions[0].name, "Repository");
    }

    #[tokio::test]
    async fn test_signed_out_requests_carry_no_token() {
        let base = start_server().await;
        let session = signed_in("old");
        let backend = backend(&base, session.clone());
        session.clear_on_logout();

        let project = backend.fetch_project(8).await.unwrap();
        assert_eq!(project.description.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported_with_body() {
        let base = start_server().await;
        let backend = backend(&base, SessionContext::new());

        let result = backend.fetch_project(404).await;

        assert_eq!(
            result.unwrap_err(),
            ServiceError::Status {
                status: 404,
                body: "Project not found".into()
            }
        );
    }

    #[tokio::test]
    async fn test_analyze_posts_wire_body_and_keeps_pattern_order() {
        let base = start_server().await;
        let backend = backend(&base, SessionContext::new());
        let request = AnalysisRequest {
            project_id: 2,
            requirements: "Users log in".into(),
            diagram_type: DiagramType::UseCase,
        };

        let response = backend.analyze(&request).await.unwrap();

        assert_eq!(response.plant_uml.as_deref(), Some("USECASE for project 2"));
        assert_eq!(
            response.patterns.unwrap().names(),
            vec!["Observer", "Builder", "Adapter"]
        );
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let base = start_server().await;
        let backend = backend(&base, SessionContext::new());
        let request = AnalysisRequest {
            project_id: 2,
            requirements: "broken".into(),
            diagram_type: DiagramType::Class,
        };

        let result = backend.analyze(&request).await;
        assert!(matches!(result, Err(ServiceError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_file_field() {
        let base = start_server().await;
        let backend = backend(&base, SessionContext::new());
        let document = RequirementDocument::new("notes.txt", b"Users borrow books".to_vec());

        let response = backend.upload_requirements(5, &document).await.unwrap();
        assert_eq!(response.content, "notes.txt: Users borrow books");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let backend = backend(&format!("http://{}/api", addr), SessionContext::new());

        let result = backend.fetch_project(1).await;
        assert!(matches!(result, Err(ServiceError::Transport(_))));
    }

    struct NoClipboard;

    impl Clipboard for NoClipboard {
        fn write_text<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<(), String>> {
            Box::pin(async { Err("no clipboard".to_string()) })
        }
    }

    struct NoLauncher;

    impl LinkLauncher for NoLauncher {
        fn open(&self, _url: &str) -> Result<(), String> {
            Err("no browser".to_string())
        }
    }

    fn http_workspace(base: &str, project_id: u64, output: &std::path::Path) -> Workspace {
        let backend = Arc::new(backend(base, signed_in("tok")));
            let deps = WorkspaceDeps {
            store: backend.clone(),
            analysis: backend,
            renderer: Arc::new(HeadlessEngine),
            capture: None,
            composer: None,
            downloads: Arc::new(DirectoryDownloadSink::new(output)),
            clipboard: Arc::new(NoClipboard),
            launcher: Arc::new(NoLauncher),
        };
        Workspace::new(project_id, &AppConfig::default(), deps, EventSink::disabled())
    }

    #[tokio::test]
    async fn test_workspace_over_http() {
        let base = start_server().await;
        let output = tempfile::TempDir::new().unwrap();
        let ws = http_workspace(&base, 6, output.path());

        ws.load().await.unwrap();
        assert_eq!(ws.requirement_text(), "Customers place orders");
        assert_eq!(ws.current().unwrap().artifact.markup, "classDiagram\nclass Order");

        ws.set_diagram_type("SEQUENCE").unwrap();
        let current = ws.analyze().await.unwrap();
        assert_eq!(current.artifact.markup, "SEQUENCE for project 6");
        assert_eq!(current.revision, 2);

        // Headless: nothing is ever mounted, so nothing is written
        let result = ws.export(aiuml_lib::ExportFormat::Png).await;
        assert!(matches!(result, Err(WorkspaceError::Export(_))));
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);

        assert!(matches!(
            ws.copy_link().await,
            Err(WorkspaceError::ShareDispatch(_))
        ));
    }

    #[tokio::test]
    async fn test_workspace_keeps_artifact_when_service_is_down() {
        let base = start_server().await;
        let output = tempfile::TempDir::new().unwrap();
        let ws = http_workspace(&base, 6, output.path());
        ws.load().await.unwrap();
        let before = ws.current();

        ws.set_requirements("overload");
        let result = ws.analyze().await;

        assert!(matches!(
            result,
            Err(WorkspaceError::Service(ServiceError::Status { status: 503, .. }))
        ));
        assert_eq!(ws.current(), before);
    }
}
