//! Serve command handler.
//!
//! Runs the question page and the JSON API on one axum router. A single
//! engine is built at startup and shared by every request.

use super::build_engine;
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Args;
use fsc_core::{AppConfig, AppError, AppResult};
use fsc_engine::{QueryEngine, RagResponse};
use fsc_view::{build_page, FormState, PageRenderer};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body (form or JSON).
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Directory under the root whose `*.hbs` files replace built-in templates.
const TEMPLATE_OVERRIDE_DIR: &str = "templates";

/// Run the web UI and JSON API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8501", env = "FSC_BIND")]
    pub bind: String,

    /// Skip the startup round trip that validates the API key and store
    #[arg(long)]
    pub skip_verify: bool,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing serve command");

        let engine = build_engine(config)?;
        if self.skip_verify {
            tracing::warn!("Skipping store verification");
        } else {
            engine
                .verify()
                .await
                .context("Store verification failed (use --skip-verify to start anyway)")?;
        }

        let renderer = PageRenderer::with_overrides(&config.root.join(TEMPLATE_OVERRIDE_DIR))?;
        let state = AppState {
            engine: Arc::new(engine),
            renderer: Arc::new(renderer),
        };

        let listener = tokio::net::TcpListener::bind(&self.bind)
            .await
            .with_context(|| format!("Failed to bind {}", self.bind))?;
        tracing::info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        Ok(())
    }
}

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn QueryEngine>,
    pub renderer: Arc<PageRenderer>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_page).post(submit_page))
        .route("/api/query", post(api_query))
        .route("/api/status", get(api_status))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Form body of `POST /`.
#[derive(Debug, Deserialize)]
struct PageForm {
    #[serde(default)]
    question: String,
    #[serde(default)]
    action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    question: String,
}

async fn show_page(State(state): State<AppState>, Query(form): Query<FormState>) -> Response {
    render(&state, &form, None)
}

async fn submit_page(State(state): State<AppState>, Form(body): Form<PageForm>) -> Response {
    if body.action.as_deref() == Some("clear") {
        return render(&state, &FormState::default(), None);
    }

    let form = FormState {
        question: body.question,
    };

    let outcome = if form.question.trim().is_empty() {
        Err(AppError::InvalidInput("Please enter a question".to_string()))
    } else {
        run_query(state.engine.as_ref(), &form.question).await
    };

    render(&state, &form, Some(&outcome))
}

async fn api_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            return ApiError::with_status(
                rejection.status(),
                AppError::InvalidInput(rejection.body_text()),
            )
            .into_response();
        }
    };

    match run_query(state.engine.as_ref(), &body.question).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn api_status(State(state): State<AppState>) -> Response {
    Json(state.engine.status()).into_response()
}

async fn health() -> &'static str {
    "ok"
}

/// Run a query and log failures; only generic messages reach the client page.
async fn run_query(engine: &dyn QueryEngine, question: &str) -> AppResult<RagResponse> {
    let result = engine.query(question).await;
    match &result {
        Ok(response) => tracing::debug!(sources = response.sources.len(), "Answered"),
        Err(e) if e.is_user_error() => tracing::debug!("Rejected question: {}", e),
        Err(e) => tracing::error!("Query failed: {}", e),
    }
    result
}

fn render(state: &AppState, form: &FormState, outcome: Option<&AppResult<RagResponse>>) -> Response {
    let page = build_page(form, &state.engine.status(), outcome);
    match state.renderer.render_page(&page) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// JSON error body (`{"error": ...}`) for the API routes.
struct ApiError {
    status: StatusCode,
    error: AppError,
}

impl ApiError {
    /// Keep a status decided upstream, e.g. 415 for a wrong content type.
    fn with_status(status: StatusCode, error: AppError) -> Self {
        Self { status, error }
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        let status = match error {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Service(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.error.to_string() });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use fsc_engine::{EngineStatus, Source, DEFAULT_CONFIDENCE, ENGINE_NAME};
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Engine that answers every question with a fixed reply, or fails.
    struct FixedEngine {
        fail_with: Option<fn() -> AppError>,
        calls: AtomicUsize,
    }

    impl FixedEngine {
        fn answering() -> Self {
            Self {
                fail_with: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(make: fn() -> AppError) -> Self {
            Self {
                fail_with: Some(make),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl QueryEngine for FixedEngine {
        fn name(&self) -> &str {
            ENGINE_NAME
        }

        fn status(&self) -> EngineStatus {
            EngineStatus {
                engine_name: ENGINE_NAME.to_string(),
                model: "gemini-2.5-flash".to_string(),
                store_id: "fileSearchStores/fsc".to_string(),
                file_count: 490,
                created_time: Some("2025-11-20 10:00:00".to_string()),
                age_hours: None,
            }
        }

        async fn query(&self, question: &str) -> AppResult<RagResponse> {
            if question.trim().is_empty() {
                return Err(AppError::InvalidInput("Please enter a question".to_string()));
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(make) = self.fail_with {
                return Err(make());
            }
            Ok(RagResponse {
                answer: format!("關於「{}」的答案", question.trim()),
                sources: vec![Source {
                    title: "392_20210722_銀行局_未指定.txt".to_string(),
                    excerpt: "罰鍰新臺幣100萬元".to_string(),
                    rank: 1,
                    document_id: Some("9ky8rgmy5pdk".to_string()),
                }],
                confidence: DEFAULT_CONFIDENCE,
                latency: 0.5,
                cost_estimate: 0.00001,
                engine_name: ENGINE_NAME.to_string(),
            })
        }
    }

    fn app(engine: Arc<FixedEngine>) -> Router {
        router(AppState {
            engine,
            renderer: Arc::new(PageRenderer::new().unwrap()),
        })
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_post(body: &str) -> Request<Body> {
        Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_api_query_success() {
        let engine = Arc::new(FixedEngine::answering());
        let response = app(engine.clone())
            .oneshot(json_post("/api/query", r#"{"question":"裁罰？"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["engine_name"], ENGINE_NAME);
        assert_eq!(json["sources"][0]["title"], "392_20210722_銀行局_未指定.txt");
        assert!(json["sources"][0].get("document_id").is_none());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_api_blank_question_is_bad_request() {
        let engine = Arc::new(FixedEngine::answering());
        let response = app(engine.clone())
            .oneshot(json_post("/api/query", r#"{"question":"   "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().contains("Invalid input"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_api_service_failure_is_bad_gateway() {
        let engine = Arc::new(FixedEngine::failing(|| {
            AppError::Service("Gemini rate limited (HTTP 429)".to_string())
        }));
        let response = app(engine)
            .oneshot(json_post("/api/query", r#"{"question":"裁罰？"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_api_malformed_json_gets_json_error() {
        let engine = Arc::new(FixedEngine::answering());
        let response = app(engine.clone())
            .oneshot(json_post("/api/query", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().contains("JSON"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_api_wrong_content_type_gets_json_error() {
        let engine = Arc::new(FixedEngine::answering());
        let request = Request::post("/api/query")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(r#"{"question":"裁罰？"}"#))
            .unwrap();
        let response = app(engine.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().contains("Content-Type"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_api_other_failure_is_internal_error() {
        let engine = Arc::new(FixedEngine::failing(|| {
            AppError::Template("broken".to_string())
        }));
        let response = app(engine)
            .oneshot(json_post("/api/query", r#"{"question":"裁罰？"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let engine = Arc::new(FixedEngine::answering());
        let question = "問".repeat(MAX_BODY_BYTES);
        let body = format!(r#"{{"question":"{}"}}"#, question);
        let response = app(engine.clone())
            .oneshot(json_post("/api/query", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_status_and_health() {
        let engine = Arc::new(FixedEngine::answering());

        let response = app(engine.clone())
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["file_count"], 490);
        // A running server always has a loaded store; there is no readiness flag
        assert!(json.get("ready").is_none());

        let response = app(engine)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_get_page_prefills_question() {
        let engine = Arc::new(FixedEngine::answering());
        let response = app(engine)
            .oneshot(
                Request::get("/?question=%E8%A3%81%E7%BD%B0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains(">裁罰</textarea>"));
        // Examples only show on an empty form
        assert!(!html.contains("範例問題"));
    }

    #[tokio::test]
    async fn test_empty_page_lists_examples() {
        let engine = Arc::new(FixedEngine::answering());
        let response = app(engine)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let html = body_string(response).await;
        assert!(html.contains("範例問題"));
        assert!(html.contains("檔案數量：<strong>490</strong>"));
    }

    #[tokio::test]
    async fn test_form_submit_renders_answer() {
        let engine = Arc::new(FixedEngine::answering());
        let response = app(engine.clone())
            .oneshot(form_post("question=%E8%A3%81%E7%BD%B0&action=submit"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("關於「裁罰」的答案"));
        assert!(html.contains("來源 1: 392_20210722_銀行局_未指定.txt"));
        assert!(html.contains("查詢完成"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_form_blank_submit_warns_without_query() {
        let engine = Arc::new(FixedEngine::answering());
        let response = app(engine.clone())
            .oneshot(form_post("question=++&action=submit"))
            .await
            .unwrap();

        let html = body_string(response).await;
        assert!(html.contains("notice warning"));
        assert!(html.contains("請輸入問題"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_form_clear_resets() {
        let engine = Arc::new(FixedEngine::answering());
        let response = app(engine.clone())
            .oneshot(form_post("question=%E8%A3%81%E7%BD%B0&action=clear"))
            .await
            .unwrap();

        let html = body_string(response).await;
        assert!(!html.contains(">裁罰</textarea>"));
        assert!(html.contains("範例問題"));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_form_service_failure_hides_cause() {
        let engine = Arc::new(FixedEngine::failing(|| {
            AppError::Service("HTTP 403: API key invalid".to_string())
        }));
        let response = app(engine)
            .oneshot(form_post("question=%E8%A3%81%E7%BD%B0"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("查詢失敗"));
        assert!(!html.contains("API key invalid"));
    }
}
