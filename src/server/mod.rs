//! 解析サービス（HTTP）
//!
//! 画像またはテキスト説明を受け取り、正規化済みの WasteAnalysis を返す。

pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::analyzer::{GeminiClient, ModelClient, UnconfiguredModel};
use crate::config::Config;
use crate::error::{Result, WasteAiError};
pub use state::AppState;

/// ルーターを作成
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/waste-identification", post(routes::identify_waste))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// サービスを起動
pub async fn run_server(config: Arc<Config>) -> Result<()> {
    let model: Arc<dyn ModelClient> = match GeminiClient::new(&config) {
        Ok(client) => {
            tracing::info!(endpoint = %client.endpoint(), "Gemini APIを使用");
            Arc::new(client)
        }
        Err(WasteAiError::MissingApiKey) => {
            tracing::warn!("APIキーが未設定のため、解析要求には500を返します");
            Arc::new(UnconfiguredModel)
        }
        Err(e) => return Err(e),
    };

    let state = AppState::new(
        model,
        config.generation_settings(),
        config.max_body_bytes,
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("解析サービス起動: http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("解析サービス停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "シグナル待機に失敗");
        std::future::pending::<()>().await;
    }
}
