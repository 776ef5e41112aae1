//! HTTP server for the document Q&A service

pub mod routes;
pub mod state;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Document Q&A HTTP server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server, connecting to every configured service
    pub async fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;
        Ok(Self { config, state })
    }

    /// Create a server around already-built state
    pub fn from_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .merge(routes::service_routes())
            .with_state(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.server.max_body_size))
            .layer(TraceLayer::new_for_http());

        if self.config.server.enable_cors {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<tokio::net::TcpListener> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))
    }

    /// Serve requests on an already-bound listener until it fails
    pub async fn serve(self, listener: tokio::net::TcpListener) -> Result<()> {
        let router = self.router();

        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Starting Q&A server on http://{}", addr);
        }

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{AnswerComposer, ALL_FAILED};
    use crate::ingestion::{Downloader, Indexer, WordChunker};
    use crate::processing::QaPipeline;
    use crate::providers::LlmProvider;
    use crate::retrieval::Retriever;
    use crate::test_support::{serve_bytes, InMemoryStore, StubBehavior, StubEmbedder, StubExtractor, StubLlm};
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const TEXT: &str = "The grace period for premium payment is thirty days. \
        Maternity expenses are covered after twenty four months of continuous coverage.";

    fn server(llm: StubLlm, input: &tempfile::TempDir) -> RagServer {
        server_with_text(llm, input, TEXT)
    }

    fn server_with_text(llm: StubLlm, input: &tempfile::TempDir, text: &str) -> RagServer {
        let mut config = RagConfig::default();
        config.input.folder = input.path().to_path_buf();

        let embedder = Arc::new(StubEmbedder::default());
        let store = Arc::new(InMemoryStore::default());
        let pipeline = QaPipeline::new(
            Downloader::new(&config.input).unwrap(),
            Indexer::new(
                Arc::new(StubExtractor::new(text)),
                WordChunker::new(10),
                embedder.clone(),
                store.clone(),
            ),
            Retriever::new(embedder, store, config.retrieval.top_k),
            AnswerComposer::new(vec![Arc::new(llm) as Arc<dyn LlmProvider>], Duration::from_secs(5)),
            true,
        );
        let state = AppState::from_parts(config, pipeline);
        state.set_ready(true);
        RagServer::from_state(state)
    }

    async fn send(server: &RagServer, request: Request<Body>) -> (StatusCode, Value) {
        let response = server.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let input = tempfile::tempdir().unwrap();
        let server = server(StubLlm::reply("gemini", "x"), &input);

        let (status, body) = send(&server, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let response = server
            .router()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_documents_lists_placeholder() {
        let input = tempfile::tempdir().unwrap();
        let server = server(StubLlm::reply("gemini", "x"), &input);

        let (status, body) = send(&server, Request::get("/documents").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{ "name": "SampleDoc", "summary": "This is a placeholder summary for the purpose of AI querying." }])
        );
    }

    #[tokio::test]
    async fn test_chat_empty_question_is_bad_request() {
        let input = tempfile::tempdir().unwrap();
        let server = server(StubLlm::reply("gemini", "x"), &input);

        for uri in ["/chat/?question=", "/chat/?question=%20%20", "/chat/"] {
            let (status, body) = send(&server, Request::post(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"]["type"], "bad_request");
        }
    }

    #[tokio::test]
    async fn test_chat_returns_answer() {
        let input = tempfile::tempdir().unwrap();
        let server = server(StubLlm::reply("gemini", "Thirty days."), &input);

        let request = Request::post("/chat/?question=What%20is%20the%20grace%20period%3F")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&server, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "answer": "Thirty days." }));
    }

    #[tokio::test]
    async fn test_chat_sentinel_when_backends_fail() {
        let input = tempfile::tempdir().unwrap();
        let server = server(StubLlm::new("gemini", StubBehavior::Fail), &input);

        let (status, body) = send(&server, Request::post("/chat?question=hi").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], ALL_FAILED);
    }

    #[tokio::test]
    async fn test_hackrx_run_returns_one_answer_per_question() {
        let input = tempfile::tempdir().unwrap();
        let base = serve_bytes(b"%PDF-1.4 policy".to_vec()).await;
        let server = server(
            StubLlm::reply("gemini", "1. Thirty days.\n2. After twenty four months.\n"),
            &input,
        );

        let (status, body) = send(
            &server,
            post_json(
                "/hackrx/run",
                json!({
                    "documents": format!("{}/policy.pdf?sig=abc", base),
                    "questions": ["What is the grace period?", "When is maternity covered?"]
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answers"], json!(["Thirty days.", "After twenty four months."]));
        assert_eq!(body["statuses"], json!(["answered", "answered"]));

        let documents = server.state().documents();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1].name, "policy.pdf");
    }

    #[tokio::test]
    async fn test_hackrx_run_download_failure_is_bad_gateway() {
        let input = tempfile::tempdir().unwrap();
        let base = serve_bytes(Vec::new()).await;
        let server = server(StubLlm::reply("gemini", "x"), &input);

        let (status, body) = send(
            &server,
            post_json(
                "/hackrx/run",
                json!({ "documents": format!("{}/missing.pdf", base), "questions": ["q?"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["type"], "download_error");
    }

    #[tokio::test]
    async fn test_hackrx_run_empty_questions() {
        let input = tempfile::tempdir().unwrap();
        let server = server(StubLlm::reply("gemini", "x"), &input);

        let (status, body) = send(
            &server,
            post_json("/hackrx/run", json!({ "documents": "http://127.0.0.1:9/x.pdf", "questions": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answers"], json!([]));
    }

    #[tokio::test]
    async fn test_hackrx_run_empty_url_is_bad_request() {
        let input = tempfile::tempdir().unwrap();
        let server = server(StubLlm::reply("gemini", "x"), &input);

        let (status, _) = send(
            &server,
            post_json("/hackrx/run", json!({ "documents": "  ", "questions": ["q?"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_hackrx_run_without_text_answers_but_lists_nothing() {
        let input = tempfile::tempdir().unwrap();
        let base = serve_bytes(b"%PDF-1.4 scanned".to_vec()).await;
        let server = server_with_text(StubLlm::reply("gemini", "1. Not stated."), &input, " \n ");

        let (status, body) = send(
            &server,
            post_json(
                "/hackrx/run",
                json!({ "documents": format!("{}/scan.pdf", base), "questions": ["What is covered?"] }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answers"], json!(["Not stated."]));

        let documents = server.state().documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].name, "SampleDoc");
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let input = tempfile::tempdir().unwrap();
        let mut config = RagConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;
        let pipeline = crate::test_support::stub_pipeline(TEXT, Arc::new(StubLlm::reply("gemini", "x")), input.path());
        let server = RagServer::from_state(AppState::from_parts(config, pipeline));

        let err = server.bind().await.unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("Failed to bind")));
    }
}
