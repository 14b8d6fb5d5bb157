//! # API REST
//!
//! REST API implementation for deckstream.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Server-Sent Events framing of generation events
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! Uses `api-shared` for request/response bodies and `deckstream-core` for everything else.

#![warn(rust_2018_idioms)]

use api_shared::{
    ErrorRes, ExportPresentationReq, ExtractColorsReq, ExtractColorsRes, GenerateImageReq,
    GenerateImageRes, GeneratePresentationReq, HealthRes, HealthService, TemplatesRes,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use deckstream_core::{
    constants::PROMPT_CHARS,
    error::codes,
    export::{export_filename, ExportRequest},
    palette::{decode_logo_base64, extract_brand_colors},
    templates::builtin_templates,
    CoreConfig, DeckExporter, ExportFailure, FailureKind, GeminiClient, GenerationFailure,
    GenerationRequest, ImageSearch, ModelProvider, Orchestrator, PaletteError, StreamEvent,
    UnsplashClient,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, Json<ErrorRes>);

/// Application state for the REST API server.
///
/// `orchestrator` is `None` when no model credential is configured; `exporter` is `None` until a
/// deck writer is plugged in.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Option<Orchestrator>,
    pub images: Arc<dyn ImageSearch>,
    pub exporter: Option<Arc<dyn DeckExporter>>,
}

impl AppState {
    /// Builds the collaborators described by `cfg`.
    pub fn from_config(cfg: &CoreConfig) -> Self {
        let orchestrator = cfg.gemini_api_key().map(|key| {
            let provider: Arc<dyn ModelProvider> = Arc::new(GeminiClient::new(
                key,
                Some(cfg.gemini_model().to_owned()),
            ));
            Orchestrator::new(provider, cfg.stream_budget())
        });
        if orchestrator.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; generation requests will be rejected");
        }

        Self {
            orchestrator,
            images: Arc::new(UnsplashClient::new(
                cfg.unsplash_access_key().map(str::to_owned),
            )),
            exporter: None,
        }
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn DeckExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        stream_presentation,
        extract_colors,
        list_templates,
        generate_image,
        export_presentation,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        api_shared::ErrorBody,
        GeneratePresentationReq,
        ExtractColorsReq,
        ExtractColorsRes,
        TemplatesRes,
        GenerateImageReq,
        GenerateImageRes,
        ExportPresentationReq,
        deck_types::Slide,
        deck_types::SlideKind,
        deck_types::SpeakerNotes,
        deck_types::BrandColors,
        deck_types::Template,
        deck_types::TemplateColors,
        deck_types::TemplateFonts,
        deck_types::LayoutKind,
    ))
)]
pub struct ApiDoc;

/// Builds the full router, including Swagger UI and a permissive CORS layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/presentations/stream", post(stream_presentation))
        .route("/presentations/export", post(export_presentation))
        .route("/brand-kit/extract-colors", post(extract_colors))
        .route("/templates", get(list_templates))
        .route("/images/generate", post(generate_image))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorRes::new(code, message)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used by monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/presentations/stream",
    request_body = GeneratePresentationReq,
    responses(
        (status = 200, description = "Event stream of chunk, slide, complete and error events", content_type = "text/event-stream", body = String),
        (status = 400, description = "Malformed body or invalid prompt/numSlides", body = ErrorRes),
        (status = 401, description = "No model credential configured", body = ErrorRes)
    )
)]
/// Streams a deck generation as Server-Sent Events.
///
/// Each event is written as `event: <type>` with `data: {"type", "data"}`. The stream always ends
/// with exactly one `complete` or `error` event. Closing the connection cancels the generation.
///
/// # Errors
/// Returns `400 REQUEST_ERROR` if the body is malformed or out of bounds, and
/// `401 INVALID_API_KEY` if no model credential is configured.
#[axum::debug_handler]
async fn stream_presentation(
    State(state): State<AppState>,
    payload: Result<Json<GeneratePresentationReq>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, codes::REQUEST_ERROR, e.body_text()))?;
    let request = GenerationRequest::new(&req.prompt, req.num_slides)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, codes::REQUEST_ERROR, e.to_string()))?;

    let Some(orchestrator) = state.orchestrator.as_ref() else {
        return Err(failure_error(GenerationFailure::new(
            FailureKind::InvalidApiKey,
            "",
        )));
    };

    let events = orchestrator.start(request);
    let body = futures_util::stream::unfold(events, |mut events| async move {
        let event = events.recv().await?;
        Some((sse_event(&event), events))
    });

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(body),
    )
        .into_response())
}

/// Reports a generation failure raised before any event was streamed.
fn failure_error(failure: GenerationFailure) -> ApiError {
    let status = StatusCode::from_u16(failure.kind.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(failure.payload().into()))
}

fn sse_event(event: &StreamEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.name()).json_data(event)
}

#[utoipa::path(
    post,
    path = "/brand-kit/extract-colors",
    request_body = ExtractColorsReq,
    responses(
        (status = 200, description = "Brand palette derived from the logo", body = ExtractColorsRes),
        (status = 400, description = "Missing or undecodable base64", body = ErrorRes),
        (status = 500, description = "Image could not be decoded", body = ErrorRes)
    )
)]
/// Derives a five-colour brand palette from an uploaded logo.
#[axum::debug_handler]
async fn extract_colors(
    payload: Result<Json<ExtractColorsReq>, JsonRejection>,
) -> Result<Json<ExtractColorsRes>, ApiError> {
    let Json(req) = payload.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, codes::VALIDATION_ERROR, e.body_text())
    })?;
    let bytes = decode_logo_base64(&req.logo_base64).map_err(palette_error)?;

    let colors = tokio::task::spawn_blocking(move || extract_brand_colors(&bytes))
        .await
        .map_err(|e| {
            tracing::error!("Colour extraction task failed: {:?}", e);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::EXTRACTION_ERROR,
                "Failed to extract colors",
            )
        })?
        .map_err(palette_error)?;

    Ok(Json(ExtractColorsRes {
        success: true,
        colors,
    }))
}

fn palette_error(e: PaletteError) -> ApiError {
    let status = match e {
        PaletteError::Decode(_) => {
            tracing::error!("Colour extraction error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };
    api_error(status, e.code(), e.to_string())
}

#[utoipa::path(
    get,
    path = "/templates",
    responses(
        (status = 200, description = "Built-in slide templates", body = TemplatesRes)
    )
)]
#[axum::debug_handler]
async fn list_templates() -> Json<TemplatesRes> {
    Json(TemplatesRes {
        templates: builtin_templates(),
    })
}

#[utoipa::path(
    post,
    path = "/images/generate",
    request_body = GenerateImageReq,
    responses(
        (status = 200, description = "Image for the prompt; url is null when none was found", body = GenerateImageRes),
        (status = 400, description = "Prompt missing or too long", body = ErrorRes)
    )
)]
/// Looks up a stock image for a slide's image prompt.
///
/// Lookup failures and a missing access key are not errors: the response carries `url: null` and
/// the prompt as alt text.
#[axum::debug_handler]
async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<GenerateImageReq>, JsonRejection>,
) -> Result<Json<GenerateImageRes>, ApiError> {
    let Json(req) = payload.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, codes::VALIDATION_ERROR, e.body_text())
    })?;
    let prompt = req.prompt.trim();
    if !PROMPT_CHARS.contains(&prompt.chars().count()) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION_ERROR,
            format!(
                "prompt must be between {} and {} characters",
                PROMPT_CHARS.start(),
                PROMPT_CHARS.end()
            ),
        ));
    }

    Ok(Json(state.images.find_image(prompt).await.into()))
}

#[utoipa::path(
    post,
    path = "/presentations/export",
    request_body = ExportPresentationReq,
    responses(
        (status = 200, description = "Binary deck file sent as an attachment"),
        (status = 400, description = "Invalid export request", body = ErrorRes),
        (status = 500, description = "Deck writer failed", body = ErrorRes),
        (status = 501, description = "No deck writer configured", body = ErrorRes)
    )
)]
/// Hands a finished deck to the configured exporter and returns the file as an attachment.
#[axum::debug_handler]
async fn export_presentation(
    State(state): State<AppState>,
    payload: Result<Json<ExportPresentationReq>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, codes::VALIDATION_ERROR, e.body_text())
    })?;
    let request = ExportRequest::from(req);
    request.validate().map_err(export_error)?;

    let Some(exporter) = state.exporter.as_ref() else {
        return Err(api_error(
            StatusCode::NOT_IMPLEMENTED,
            codes::EXPORT_UNAVAILABLE,
            "Presentation export is not available on this server",
        ));
    };

    let mut deck = exporter.export(&request).await.map_err(export_error)?;
    if deck.filename.is_empty() {
        deck.filename = export_filename(chrono::Utc::now());
    }
    tracing::info!(
        slides = request.slides.len(),
        bytes = deck.bytes.len(),
        "exported {}",
        deck.filename
    );

    Ok((
        [
            (header::CONTENT_TYPE, deck.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", deck.filename),
            ),
        ],
        deck.bytes,
    )
        .into_response())
}

fn export_error(e: ExportFailure) -> ApiError {
    let status = match e {
        ExportFailure::Invalid(_) => StatusCode::BAD_REQUEST,
        ExportFailure::Writer(_) => {
            tracing::error!("Export error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.code(), e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use deckstream_core::{export::PPTX_CONTENT_TYPE, ExportedDeck, ImageResult, TokenStream};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct ScriptedProvider {
        tokens: Vec<Result<String, GenerationFailure>>,
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn stream_generate(&self, _prompt: &str) -> Result<TokenStream, GenerationFailure> {
            Ok(Box::pin(futures_util::stream::iter(self.tokens.clone())))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    struct FixedImages;

    #[async_trait]
    impl ImageSearch for FixedImages {
        async fn find_image(&self, prompt: &str) -> ImageResult {
            ImageResult {
                url: Some("https://images.example/1".into()),
                alt: prompt.to_owned(),
            }
        }
    }

    struct StaticExporter;

    #[async_trait]
    impl DeckExporter for StaticExporter {
        async fn export(&self, _request: &ExportRequest) -> Result<ExportedDeck, ExportFailure> {
            Ok(ExportedDeck {
                filename: "presentation-1.pptx".into(),
                content_type: PPTX_CONTENT_TYPE.into(),
                bytes: b"PK\x03\x04".to_vec(),
            })
        }
    }

    fn state(tokens: Option<Vec<Result<String, GenerationFailure>>>) -> AppState {
        AppState {
            orchestrator: tokens.map(|tokens| {
                Orchestrator::new(
                    Arc::new(ScriptedProvider { tokens }),
                    std::time::Duration::from_secs(55),
                )
            }),
            images: Arc::new(FixedImages),
            exporter: None,
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn send(state: AppState, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = router(state).oneshot(req).await.expect("response");
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        (status, body.to_vec())
    }

    async fn send_json(state: AppState, req: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(state, req).await;
        (status, serde_json::from_slice(&body).expect("json body"))
    }

    fn export_body(slides: Vec<Value>) -> Value {
        json!({
            "slides": slides,
            "brandColors": {
                "primary": "#4287F5",
                "secondary": "#9B9B9B",
                "accent": "#F5B042",
                "background": "#6AAFFF",
                "text": "#F5F5F5"
            },
            "template": builtin_templates()[0],
            "presentationTitle": "Quarterly review"
        })
    }

    fn slide() -> Value {
        json!({
            "id": "slide-1",
            "type": "title",
            "title": "Quarterly review",
            "bullets": ["Revenue grew", "Costs fell", "Hiring paused"],
            "speakerNotes": {
                "script": "Welcome everyone.",
                "duration": "1min",
                "tips": ["Smile"],
                "keyPoints": ["Growth", "Focus"]
            },
            "imagePrompt": "Bar chart trending upwards"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::get("/health").body(Body::empty()).expect("request");
        let (status, body) = send_json(state(None), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_templates_lists_builtins() {
        let req = Request::get("/templates").body(Body::empty()).expect("request");
        let (status, body) = send_json(state(None), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["templates"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["templates"][1]["id"], "modern");
    }

    #[tokio::test]
    async fn test_stream_rejects_malformed_body() {
        let req = Request::post("/presentations/stream")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .expect("request");
        let (status, body) = send_json(state(Some(vec![])), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "REQUEST_ERROR");
    }

    #[tokio::test]
    async fn test_stream_rejects_out_of_range_slide_count() {
        let req = post_json(
            "/presentations/stream",
            json!({"prompt": "Solar energy", "numSlides": 21}),
        );
        let (status, body) = send_json(state(Some(vec![])), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "REQUEST_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("numSlides")));
    }

    #[tokio::test]
    async fn test_stream_without_credential_is_unauthorised() {
        let req = post_json("/presentations/stream", json!({"prompt": "Solar energy"}));
        let (status, body) = send_json(state(None), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_API_KEY");
    }

    #[test]
    fn test_failure_error_uses_kind_status() {
        let (status, Json(body)) =
            failure_error(GenerationFailure::classify("429 quota exceeded"));
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body.error.code, "QUOTA_EXCEEDED");

        let (status, _) = failure_error(GenerationFailure::new(FailureKind::ContentFiltered, ""));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stream_emits_sse_events() {
        let tokens = vec![Ok("{".to_owned()), Ok("}".to_owned())];
        let req = post_json(
            "/presentations/stream",
            json!({"prompt": "Solar energy", "numSlides": 3}),
        );
        let resp = router(state(Some(tokens))).oneshot(req).await.expect("response");

        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(
            headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );
        assert_eq!(
            headers.get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some("no-cache")
        );
        assert_eq!(
            headers.get("x-accel-buffering").and_then(|v| v.to_str().ok()),
            Some("no")
        );

        let body = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8(body.to_vec()).expect("utf8");
        assert!(text.contains("event: chunk"));
        assert!(text.contains("event: complete"));
        assert!(text.contains(r#"{"type":"complete","data":null}"#));
    }

    #[tokio::test]
    async fn test_stream_reports_provider_failure_as_event() {
        let tokens = vec![
            Ok("{\"title\":".to_owned()),
            Err(GenerationFailure::classify("Quota exceeded for project")),
        ];
        let req = post_json("/presentations/stream", json!({"prompt": "Solar energy"}));
        let (status, body) = send(state(Some(tokens)), req).await;
        assert_eq!(status, StatusCode::OK);

        let text = String::from_utf8(body).expect("utf8");
        assert!(text.contains("event: error"));
        assert!(text.contains("QUOTA_EXCEEDED"));
        assert!(!text.contains("event: complete"));
    }

    #[tokio::test]
    async fn test_extract_colors_rejects_bad_base64() {
        let req = post_json(
            "/brand-kit/extract-colors",
            json!({"logoBase64": "***not base64***"}),
        );
        let (status, body) = send_json(state(None), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_extract_colors_reports_undecodable_image() {
        let req = post_json(
            "/brand-kit/extract-colors",
            json!({"logoBase64": "aGVsbG8gd29ybGQ="}),
        );
        let (status, body) = send_json(state(None), req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_image() {
        let req = post_json("/images/generate", json!({"prompt": "Solar panels on a roof"}));
        let (status, body) = send_json(state(None), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "https://images.example/1");
        assert_eq!(body["alt"], "Solar panels on a roof");

        let req = post_json("/images/generate", json!({"prompt": "   "}));
        let (status, body) = send_json(state(None), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_export_without_exporter_is_not_implemented() {
        let req = post_json("/presentations/export", export_body(vec![slide()]));
        let (status, body) = send_json(state(None), req).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["error"]["code"], "EXPORT_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_export_rejects_empty_deck() {
        let app_state = state(None).with_exporter(Arc::new(StaticExporter));
        let req = post_json("/presentations/export", export_body(vec![]));
        let (status, body) = send_json(app_state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_export_returns_attachment() {
        let app_state = state(None).with_exporter(Arc::new(StaticExporter));
        let req = post_json("/presentations/export", export_body(vec![slide()]));
        let resp = router(app_state).oneshot(req).await.expect("response");

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
            Some("attachment; filename=\"presentation-1.pptx\"")
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some(PPTX_CONTENT_TYPE)
        );
        let body = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"PK\x03\x04");
    }
}
