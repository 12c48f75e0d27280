//! HTTP surface for pdfchat.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /documents/upload` – Multipart upload (part `file`, `application/pdf`). Extracts the
//!   text, summarizes it, and stores the summary. Returns `{document_id, filename, status, message}`,
//!   or `413` when the body exceeds the configured upload limit.
//! - `GET /documents/list` – Stored documents with a 100-character summary preview.
//! - `DELETE /documents/{document_id}` – Remove a document; `404` when the id is unknown.
//! - `POST /chat/query` – Answer `{query, document_ids}` using the selected summaries as context.
//! - `GET /health` – Server status plus language-model reachability.
//! - `GET /metrics` – Ingestion and query counters.
//! - `GET /commands` – Machine-readable command catalog.
//!
//! Failures are returned as `{"status": "error", "message": ...}`. Any origin may call the API.

use crate::pipeline::{DocumentApi, DocumentListing, IngestionReceipt, PipelineError, QueryAnswer};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::MultipartError,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Build the HTTP router exposing the document API surface.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: DocumentApi + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(
            "/documents/upload",
            post(move |state: State<Arc<S>>, multipart: Multipart| {
                upload_document(state, multipart, max_upload_bytes)
            })
            .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/documents/list", get(list_documents::<S>))
        .route("/documents/:document_id", delete(delete_document::<S>))
        .route("/chat/query", post(chat_query::<S>))
        .route("/health", get(health::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(cors)
        .with_state(service)
}

/// Accept a multipart PDF upload and run the ingestion pipeline.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<Json<IngestionReceipt>, AppError>
where
    S: DocumentApi,
{
    let invalid_multipart = |error: MultipartError| -> AppError {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            PipelineError::UploadTooLarge(max_upload_bytes).into()
        } else {
            let message = format!("malformed upload: {}", error.body_text());
            PipelineError::InvalidRequest(message).into()
        }
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| PipelineError::InvalidRequest("upload is missing a filename".into()))?;
        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            return Err(
                PipelineError::InvalidRequest("only PDF files are accepted".into()).into(),
            );
        }
        let bytes = field.bytes().await.map_err(invalid_multipart)?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) = upload
        .ok_or_else(|| PipelineError::InvalidRequest("multipart field `file` is required".into()))?;
    let receipt = service.upload(filename, bytes).await?;
    Ok(Json(receipt))
}

/// Response body for `GET /documents/list`.
#[derive(Serialize)]
struct ListResponse {
    documents: Vec<DocumentListing>,
}

/// List stored documents in storage order.
async fn list_documents<S>(State(service): State<Arc<S>>) -> Result<Json<ListResponse>, AppError>
where
    S: DocumentApi,
{
    let documents = service.list_documents().await?;
    Ok(Json(ListResponse { documents }))
}

/// Response body for a successful delete.
#[derive(Serialize)]
struct DeleteResponse {
    message: String,
}

/// Delete one document by identifier.
async fn delete_document<S>(
    State(service): State<Arc<S>>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError>
where
    S: DocumentApi,
{
    service.delete_document(&document_id).await?;
    Ok(Json(DeleteResponse {
        message: "Document deleted successfully".into(),
    }))
}

/// Request body for `POST /chat/query`.
#[derive(Deserialize)]
struct ChatRequest {
    /// Natural-language question.
    query: String,
    /// Documents whose summaries form the context.
    #[serde(default)]
    document_ids: Vec<String>,
}

/// Answer a question over the selected documents.
async fn chat_query<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<QueryAnswer>, AppError>
where
    S: DocumentApi,
{
    let ChatRequest {
        query,
        document_ids,
    } = request;
    let answer = service.query(query, document_ids).await?;
    Ok(Json(answer))
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    backend_reachable: bool,
}

/// Report server liveness and language-model reachability.
async fn health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: DocumentApi,
{
    let backend_reachable = service.backend_reachable().await;
    let message = if backend_reachable {
        "Backend running successfully"
    } else {
        "Backend running; language model unreachable"
    };
    Json(HealthResponse {
        status: "healthy",
        message,
        backend_reachable,
    })
}

/// Return the ingestion and query counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> impl IntoResponse
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by tools and clients.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/documents/upload",
                description: "Upload a PDF as multipart field `file`; its text is summarized and stored. Returns { \"document_id\", \"filename\", \"status\", \"message\" }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "list",
                method: "GET",
                path: "/documents/list",
                description: "List stored documents with a summary preview.",
                request_example: None,
            },
            CommandDescriptor {
                name: "delete",
                method: "DELETE",
                path: "/documents/{document_id}",
                description: "Delete a stored document by id.",
                request_example: None,
            },
            CommandDescriptor {
                name: "query",
                method: "POST",
                path: "/chat/query",
                description: "Ask a question answered from the summaries of the selected documents.",
                request_example: Some(json!({
                    "query": "What are these documents about?",
                    "document_ids": ["3f2c7f0e-0000-4000-8000-000000000000"]
                })),
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Server status and language-model reachability.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Ingestion and query counters.",
                request_example: None,
            },
        ],
    })
}

struct AppError(PipelineError);

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::ExtractionFailure(_)
            | PipelineError::EmptyContent
            | PipelineError::NoMatchingDocuments
            | PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PipelineError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            PipelineError::DuplicateIdentifier(_) | PipelineError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed with internal error");
            format!("Internal server error ({})", diagnostic(&self.0))
        } else {
            self.0.to_string()
        };
        let body = json!({ "status": "error", "message": message });
        (status, Json(body)).into_response()
    }
}

fn diagnostic(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::DuplicateIdentifier(_) => "identifier collision",
        _ => "storage failure",
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::extraction::PdfTextExtractor;
    use crate::extraction::test_support::build_pdf;
    use crate::metrics::MetricsSnapshot;
    use crate::pipeline::test_support::ScriptedBackend;
    use crate::pipeline::{
        DocumentApi, DocumentListing, DocumentService, IngestionReceipt, PipelineError,
        QueryAnswer, ServiceSettings,
    };
    use crate::store::InMemoryDocumentStore;
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pdfchat-test-boundary";
    const LIMIT: usize = 1024 * 1024;

    fn app(backend: ScriptedBackend) -> Router {
        let service = DocumentService::new(
            Arc::new(backend),
            Arc::new(PdfTextExtractor::new()),
            Arc::new(InMemoryDocumentStore::new()),
            ServiceSettings::default(),
        );
        create_router(Arc::new(service), LIMIT)
    }

    fn multipart_body(filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(filename: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
        raw_upload_request(multipart_body(filename, content_type, bytes))
    }

    fn raw_upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/documents/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    fn json_request(method: Method, uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.expect("router response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn commands_catalog_exposes_upload_and_query() {
        let commands = get_commands().await.0.commands;
        let upload = commands
            .iter()
            .find(|cmd| cmd.name == "upload")
            .expect("upload command present");
        assert_eq!(upload.method, "POST");
        assert_eq!(upload.path, "/documents/upload");
        assert!(commands.iter().any(|cmd| cmd.path == "/chat/query"));
    }

    #[tokio::test]
    async fn upload_list_query_delete_round() {
        let app = app(ScriptedBackend::answering("Alpha summary"));

        let (status, receipt) = send(
            &app,
            upload_request("a.pdf", "application/pdf", &build_pdf(&[Some("Alpha text")])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["filename"], "a.pdf");
        assert_eq!(receipt["status"], "success");
        let id = receipt["document_id"].as_str().expect("id").to_string();

        let (status, listing) = send(&app, empty_request(Method::GET, "/documents/list")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing["documents"][0]["id"], id.as_str());
        assert_eq!(listing["documents"][0]["summary"], "Alpha summary");

        let (status, answer) = send(
            &app,
            json_request(
                Method::POST,
                "/chat/query",
                json!({ "query": "What?", "document_ids": [id] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answer["status"], "success");
        assert_eq!(answer["response"], "Alpha summary");

        let uri = format!("/documents/{id}");
        let (status, _) = send(&app, empty_request(Method::DELETE, &uri)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, empty_request(Method::DELETE, &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn non_pdf_upload_is_rejected() {
        let app = app(ScriptedBackend::answering("unused"));
        let (status, body) = send(&app, upload_request("notes.txt", "text/plain", b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap_or_default().contains("PDF"));

        let (_, listing) = send(&app, empty_request(Method::GET, "/documents/list")).await;
        assert_eq!(listing["documents"], json!([]));
    }

    #[tokio::test]
    async fn oversized_upload_is_payload_too_large() {
        let service = DocumentService::new(
            Arc::new(ScriptedBackend::answering("unused")),
            Arc::new(PdfTextExtractor::new()),
            Arc::new(InMemoryDocumentStore::new()),
            ServiceSettings::default(),
        );
        let app = create_router(Arc::new(service), 64);

        let oversized = upload_request("big.pdf", "application/pdf", &[b'x'; 4096]);
        let (status, body) = send(&app, oversized).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["status"], "error");
        assert!(
            body["message"]
                .as_str()
                .unwrap_or_default()
                .starts_with("File too large")
        );
    }

    #[tokio::test]
    async fn upload_without_file_part_is_rejected() {
        let app = app(ScriptedBackend::answering("unused"));
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
        );

        let (status, body) = send(&app, raw_upload_request(body.into_bytes())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["message"]
                .as_str()
                .unwrap_or_default()
                .contains("`file` is required")
        );
    }

    #[tokio::test]
    async fn upload_without_filename_is_rejected() {
        let app = app(ScriptedBackend::answering("unused"));
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(&build_pdf(&[Some("Alpha text")]));
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let (status, body) = send(&app, raw_upload_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["message"]
                .as_str()
                .unwrap_or_default()
                .contains("missing a filename")
        );
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() {
        let app = app(ScriptedBackend::answering("unused"));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/chat/query")
            .header("origin", "http://localhost:8501")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .expect("request");

        let response = app.oneshot(request).await.expect("router response");

        assert!(response.status().is_success());
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn image_only_pdf_is_bad_request() {
        let app = app(ScriptedBackend::answering("unused"));
        let (status, body) = send(
            &app,
            upload_request("scan.pdf", "application/pdf", &build_pdf(&[None])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No text could be extracted from the PDF");
    }

    #[tokio::test]
    async fn query_without_matches_is_bad_request() {
        let app = app(ScriptedBackend::answering("unused"));
        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/chat/query",
                json!({ "query": "What?", "document_ids": ["missing"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn query_backend_failure_is_bad_gateway() {
        let app = app(ScriptedBackend::offline());
        let (_, receipt) = send(
            &app,
            upload_request("a.pdf", "application/pdf", &build_pdf(&[Some("Alpha text")])),
        )
        .await;
        let id = receipt["document_id"].as_str().expect("id").to_string();

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/chat/query",
                json!({ "query": "What?", "document_ids": [id] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn health_reports_backend_reachability() {
        let (status, body) = send(
            &app(ScriptedBackend::offline()),
            empty_request(Method::GET, "/health"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend_reachable"], false);
    }

    struct BrokenStoreService;

    #[async_trait]
    impl DocumentApi for BrokenStoreService {
        async fn upload(
            &self,
            _filename: String,
            _bytes: Vec<u8>,
        ) -> Result<IngestionReceipt, PipelineError> {
            Err(PipelineError::Internal("disk full at /var/lib/secret".into()))
        }

        async fn list_documents(&self) -> Result<Vec<DocumentListing>, PipelineError> {
            Err(PipelineError::Internal("disk full at /var/lib/secret".into()))
        }

        async fn delete_document(&self, _document_id: &str) -> Result<(), PipelineError> {
            Err(PipelineError::Internal("disk full at /var/lib/secret".into()))
        }

        async fn query(
            &self,
            _question: String,
            _document_ids: Vec<String>,
        ) -> Result<QueryAnswer, PipelineError> {
            Err(PipelineError::Internal("disk full at /var/lib/secret".into()))
        }

        async fn backend_reachable(&self) -> bool {
            true
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let app = create_router(Arc::new(BrokenStoreService), LIMIT);
        let (status, body) = send(&app, empty_request(Method::GET, "/documents/list")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["message"].as_str().expect("message");
        assert!(message.starts_with("Internal server error"));
        assert!(!message.contains("/var/lib/secret"));
    }
}
