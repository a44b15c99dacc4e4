//! ルートハンドラ

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::state::AppState;
use crate::analyzer;
use crate::error::{Result, WasteAiError};
use agri_waste_common::{AnalysisInput, AnalysisRequest, AnalysisResponse, WasteAnalysis};

const BAD_BODY_MESSAGE: &str = "Request body must be JSON with an image or description";
const BODY_TOO_LARGE_MESSAGE: &str = "Request body is too large";

/// POST /waste-identification
pub async fn identify_waste(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalysisRequest>, JsonRejection>,
) -> (StatusCode, Json<AnalysisResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let status = rejection.status();
            tracing::warn!(%status, error = %rejection.body_text(), "リクエストボディを解釈できません");
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                BODY_TOO_LARGE_MESSAGE
            } else {
                BAD_BODY_MESSAGE
            };
            return (status, Json(AnalysisResponse::failure(message)));
        }
    };

    match run_analysis(&state, &request).await {
        Ok(analysis) => (StatusCode::OK, Json(AnalysisResponse::ok(analysis))),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                tracing::error!(error = %e, "waste-identification 失敗");
            } else {
                tracing::warn!(error = %e, "waste-identification 入力エラー");
            }
            (status, Json(AnalysisResponse::failure(e.user_message())))
        }
    }
}

async fn run_analysis(state: &AppState, request: &AnalysisRequest) -> Result<WasteAnalysis> {
    let input = AnalysisInput::from_request(request.image.as_deref(), request.description.as_deref())
        .map_err(WasteAiError::from)?;
    analyzer::analyze(state.model.as_ref(), &input, &state.settings).await
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
