//! HTTP surface for deck generation.
//!
//! Serves the chat page, accepts topics on `POST /ask` and hands generated
//! decks back as downloads under `/static/ppt/`.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use deckgen_core::Error;
use deckgen_service::DeckPipeline;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

/// URL prefix under which generated decks are downloadable.
pub const DOWNLOAD_PREFIX: &str = "/static/ppt";

/// MIME type of a PowerPoint Open XML presentation.
pub const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const SUCCESS_ANSWER: &str = "✅ PPT generated!";

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared state for all handlers.
pub struct AppState {
    pub pipeline: DeckPipeline,
}

/// Body of `POST /ask`.
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to `POST /ask`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppt: Option<String>,
}

/// A pipeline error rendered as a JSON reply.
struct ApiError(Error);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            Error::EmptyTopic | Error::InvalidFileName(_) => StatusCode::BAD_REQUEST,
            Error::LlmFailed(_) | Error::LookupFailed(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = AskResponse {
            answer: self.0.public_message().to_string(),
            ppt: None,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Build the application router.
pub fn router(pipeline: DeckPipeline) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route(&format!("{}/:filename", DOWNLOAD_PREFIX), get(download))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(pipeline: DeckPipeline, addr: SocketAddr) -> std::io::Result<()> {
    let output_dir = pipeline.renderer().output_dir().display().to_string();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!(
        "Listening on http://{} (decks in {})",
        listener.local_addr()?,
        output_dir
    );
    axum::serve(listener, router(pipeline)).await
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "OK"
}

/// A body that is missing or not JSON counts as an empty topic.
fn parse_ask(body: &[u8]) -> AskRequest {
    serde_json::from_slice(body).unwrap_or_default()
}

async fn ask(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = parse_ask(&body);
    let message = request.message.unwrap_or_default();

    match state.pipeline.generate(&message).await {
        Ok(deck) => {
            log::info!(
                "Served deck {} ({} slides)",
                deck.file_name,
                deck.slide_count
            );
            Json(AskResponse {
                answer: SUCCESS_ANSWER.to_string(),
                ppt: Some(format!("{}/{}", DOWNLOAD_PREFIX, deck.file_name)),
            })
            .into_response()
        }
        Err(e) => {
            if !matches!(e, Error::EmptyTopic) {
                log::error!("Deck generation failed: {}", e);
            }
            ApiError(e).into_response()
        }
    }
}

async fn download(State(state): State<Arc<AppState>>, Path(filename): Path<String>) -> Response {
    let path = match state.pipeline.renderer().resolve(&filename) {
        Ok(path) => path,
        Err(e) => {
            log::warn!("Rejected download name '{}'", filename);
            return ApiError(e).into_response();
        }
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let disposition = format!("attachment; filename=\"{}\"", filename);
            (
                [
                    (header::CONTENT_TYPE, PPTX_CONTENT_TYPE.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Deck not found").into_response()
        }
        Err(e) => {
            log::error!("Failed to read {}: {}", path.display(), e);
            ApiError(Error::IoError(e)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use deckgen_core::{Result, Topic};
    use deckgen_pptx::{DeckReader, DeckRenderer};
    use deckgen_service::{LanguageModel, SummarySource};
    use tower::ServiceExt;

    struct StaticSummary;

    #[async_trait]
    impl SummarySource for StaticSummary {
        async fn summarize(&self, topic: &Topic) -> Result<String> {
            Ok(format!("{} is a topic.", topic))
        }
    }

    struct FixedModel(std::result::Result<String, String>);

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.0.clone().map_err(Error::LlmFailed)
        }
    }

    fn app(dir: &std::path::Path, reply: std::result::Result<&str, &str>) -> Router {
        let reply = reply.map(str::to_string).map_err(str::to_string);
        router(DeckPipeline::new(
            Arc::new(StaticSummary),
            Arc::new(FixedModel(reply)),
            DeckRenderer::new(dir),
        ))
    }

    fn ask_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: Response) -> AskResponse {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ask_generates_downloadable_deck() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), Ok("1. Alpha\n2. Beta"));

        let res = app
            .clone()
            .oneshot(ask_request(r#"{"message": "solar system"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let reply = json_body(res).await;
        assert_eq!(reply.answer, "✅ PPT generated!");

        let url = reply.ppt.unwrap();
        assert!(url.starts_with("/static/ppt/solar_system_"));
        assert!(url.ends_with(".pptx"));

        let res = app
            .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], PPTX_CONTENT_TYPE);
        let disposition = res.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment;"));

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let slides = DeckReader::new()
            .read(std::io::Cursor::new(bytes.to_vec()))
            .unwrap();
        assert_eq!(slides.len(), 3);
        assert_eq!(slides[0].paragraphs, vec!["Solar System"]);
        assert_eq!(slides[1].paragraphs, vec!["-Alpha", "-Beta"]);
    }

    #[tokio::test]
    async fn test_ask_empty_topic() {
        let dir = tempfile::tempdir().unwrap();

        for body in [r#"{"message": "   "}"#, "{}", "not json"] {
            let res = app(dir.path(), Ok("- x"))
                .oneshot(ask_request(body))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            let reply = json_body(res).await;
            assert_eq!(reply.answer, "❓ Please enter a topic.");
            assert_eq!(reply.ppt, None);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ask_llm_failure() {
        let dir = tempfile::tempdir().unwrap();
        let res = app(dir.path(), Err("401 Unauthorized - secret detail"))
            .oneshot(ask_request(r#"{"message": "volcanoes"}"#))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let reply = json_body(res).await;
        assert_eq!(reply.answer, "LLM Error: could not generate slide content.");
        assert_eq!(reply.ppt, None);
    }

    #[tokio::test]
    async fn test_ask_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"not a directory").unwrap();

        let res = app(&blocked, Ok("- x"))
            .oneshot(ask_request(r#"{"message": "volcanoes"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(res).await.answer, "❌ Failed to build the presentation.");
    }

    #[tokio::test]
    async fn test_download_rejects_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), Ok("- x"));

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/static/ppt/..%2Fsecret.pptx")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/static/ppt/missing_abcde.pptx")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), Ok(""));

        let res = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/ask"));

        let res = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[test]
    fn test_parse_ask_is_lenient() {
        assert_eq!(
            parse_ask(br#"{"message": "x"}"#).message.as_deref(),
            Some("x")
        );
        assert_eq!(parse_ask(b"").message, None);
        assert_eq!(parse_ask(br#"{"message": null}"#).message, None);
    }
}
