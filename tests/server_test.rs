//! 解析サービスのルートテスト
//!
//! 外部モデルはスタブに差し替えて検証

use agri_waste_ai::analyzer::{ModelClient, UnconfiguredModel};
use agri_waste_ai::error::{Result, WasteAiError};
use agri_waste_ai::server::{create_router, AppState};
use agri_waste_common::{GeminiRequest, GenerationSettings};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

enum Reply {
    Text(&'static str),
    Upstream,
    Malformed,
}

struct StubModel {
    reply: Reply,
    calls: AtomicUsize,
    last_request: Mutex<Option<Value>>,
}

impl StubModel {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ModelClient for StubModel {
    async fn generate(&self, request: &GeminiRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(serde_json::to_value(request).unwrap());
        match self.reply {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::Upstream => Err(WasteAiError::Upstream("status 500".into())),
            Reply::Malformed => Err(WasteAiError::MalformedUpstreamResponse(
                "response has no candidates".into(),
            )),
        }
    }
}

const RICE_HUSK: &str = r#"```json
{
  "wasteType": "Rice Husk",
  "recyclingMethods": ["Biochar production", "Silica extraction",],
  "marketValue": "₹1500-2500 per ton",
  "interestedIndustries": ["Cement", "Power plants"],
  "environmentalImpact": "{\"environmentalImpact\": \"reduces CO2\"}"
}
```"#;

fn app(model: Arc<StubModel>) -> Router {
    create_router(AppState::new(model, GenerationSettings::default(), 1024 * 1024))
}

async fn post_json(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/waste-identification")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_description_returns_normalized_analysis() {
    let model = StubModel::new(Reply::Text(RICE_HUSK));
    let (status, body) = post_json(app(model.clone()), r#"{"description": "husk left after milling"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["analysis"]["wasteType"], "Rice Husk");
    assert_eq!(
        body["analysis"]["recyclingMethods"],
        serde_json::json!(["Biochar production", "Silica extraction"])
    );
    assert_eq!(body["analysis"]["environmentalImpact"], "reduces CO2");
    assert!(body.get("error").is_none());

    let sent = model.last_request.lock().unwrap().clone().unwrap();
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.ends_with("Waste description: husk left after milling"));
}

#[tokio::test]
async fn test_image_is_sent_without_data_url_prefix() {
    let model = StubModel::new(Reply::Text(RICE_HUSK));
    let (status, _) = post_json(
        app(model.clone()),
        r#"{"image": "data:image/png;base64,/9j/4AAQ"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sent = model.last_request.lock().unwrap().clone().unwrap();
    let inline = &sent["contents"][0]["parts"][1]["inline_data"];
    assert_eq!(inline["mime_type"], "image/jpeg");
    assert_eq!(inline["data"], "/9j/4AAQ");
}

#[tokio::test]
async fn test_missing_input_is_bad_request() {
    let model = StubModel::new(Reply::Text(RICE_HUSK));
    let (status, body) = post_json(app(model.clone()), r#"{"description": "   "}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Either image or description is required");
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_image_is_bad_request() {
    let model = StubModel::new(Reply::Text(RICE_HUSK));
    let (status, body) = post_json(app(model.clone()), r#"{"image": "data:image/jpeg;base64,@@@"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreadable_body_is_bad_request() {
    let model = StubModel::new(Reply::Text(RICE_HUSK));
    let (status, body) = post_json(app(model), "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_upstream_error_is_bad_gateway() {
    let model = StubModel::new(Reply::Upstream);
    let (status, body) = post_json(app(model.clone()), r#"{"description": "cotton stalks"}"#).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to analyze waste");
    assert!(body.get("analysis").is_none());
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_upstream_is_bad_gateway() {
    let model = StubModel::new(Reply::Malformed);
    let (status, body) = post_json(app(model), r#"{"description": "cotton stalks"}"#).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to analyze waste");
}

#[tokio::test]
async fn test_prose_reply_is_degraded_success() {
    let model = StubModel::new(Reply::Text("This waste can be composted."));
    let (status, body) = post_json(app(model), r#"{"description": "vegetable peels"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["analysis"]["wasteType"], "Unknown");
    assert_eq!(
        body["analysis"]["recyclingMethods"],
        serde_json::json!(["This waste can be composted."])
    );
}

#[tokio::test]
async fn test_oversized_body_is_payload_too_large() {
    let model = StubModel::new(Reply::Text(RICE_HUSK));
    let body = format!(r#"{{"description": "{}"}}"#, "straw ".repeat(200_000));
    let (status, body) = post_json(app(model.clone()), &body).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_api_key_is_internal_error() {
    let router = create_router(AppState::new(
        Arc::new(UnconfiguredModel),
        GenerationSettings::default(),
        1024 * 1024,
    ));
    let (status, body) = post_json(router, r#"{"description": "cotton stalks"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Analysis service is not configured");
}

#[tokio::test]
async fn test_health() {
    let model = StubModel::new(Reply::Text(RICE_HUSK));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(model).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let model = StubModel::new(Reply::Text(RICE_HUSK));
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/waste-identification")
        .header("origin", "https://agricycle.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,apikey")
        .body(Body::empty())
        .unwrap();

    let response = app(model.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}
