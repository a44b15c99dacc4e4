//! Gemini API クライアント
//!
//! generateContent を1回だけ呼び出す。再試行はしない。

use super::ModelClient;
use crate::config::Config;
use crate::error::{Result, WasteAiError};
use agri_waste_common::{extract_text, GeminiRequest};
use async_trait::async_trait;
use std::time::Duration;

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.get_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| WasteAiError::Config(format!("HTTPクライアント初期化失敗: {}", e)))?;

        Ok(Self {
            http,
            endpoint: Self::endpoint_for(&config.api_base_url, &config.model),
            api_key,
        })
    }

    pub fn endpoint_for(base_url: &str, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: &GeminiRequest) -> Result<String> {
        tracing::debug!(endpoint = %self.endpoint, "Gemini APIへリクエスト送信");

        // APIキーはURLに含めない（エラーメッセージやログへの漏洩防止）
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| WasteAiError::Upstream(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(500).collect();
            tracing::error!(%status, body = %preview, "Gemini APIエラー");
            return Err(WasteAiError::Upstream(format!("status {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WasteAiError::Upstream(e.without_url().to_string()))?;

        extract_text(&body).map_err(|e| {
            let preview: String = body.chars().take(500).collect();
            tracing::error!(error = %e, body = %preview, "Gemini APIレスポンスの構造が想定外");
            WasteAiError::MalformedUpstreamResponse(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_for() {
        assert_eq!(
            GeminiClient::endpoint_for("https://generativelanguage.googleapis.com/v1beta/", "gemini-1.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = Config::default();
        assert!(matches!(
            GeminiClient::new(&config),
            Err(WasteAiError::MissingApiKey)
        ));
    }

    #[test]
    fn test_new_with_key() {
        let config = Config {
            api_key: Some("test-key".into()),
            model: "gemini-2.0-flash".into(),
            ..Config::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert!(client.endpoint().ends_with("/models/gemini-2.0-flash:generateContent"));
        assert!(!client.endpoint().contains("test-key"));
    }
}
