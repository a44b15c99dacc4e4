//! 解析サービスのHTTPクライアントと画像読み込み

use crate::error::{Result, WasteAiError};
use agri_waste_common::{data_url, AnalysisInput, AnalysisRequest, AnalysisResponse, WasteAnalysis};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::path::Path;
use std::time::Duration;

/// 送信前に再エンコードするJPEG品質
const JPEG_QUALITY: u8 = 80;

/// 画像ファイルを読み込み、最大辺を制限したJPEGのData URLにする
pub fn load_image_data_url(path: &Path, max_size: u32) -> Result<String> {
    if !path.exists() {
        return Err(WasteAiError::ImageLoad(format!(
            "ファイルが見つかりません: {}",
            path.display()
        )));
    }

    let img = image::open(path)
        .map_err(|e| WasteAiError::ImageLoad(format!("{}: {}", path.display(), e)))?;

    let img = if img.width() > max_size || img.height() > max_size {
        img.resize(max_size, max_size, FilterType::Triangle)
    } else {
        img
    };

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .encode_image(&img.to_rgb8())
        .map_err(|e| WasteAiError::ImageLoad(format!("JPEGエンコード失敗: {}", e)))?;

    Ok(data_url::encode("image/jpeg", &buf))
}

/// リモートの解析サービス
pub struct ServiceClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WasteAiError::Config(format!("HTTPクライアント初期化失敗: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/waste-identification", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn analyze(&self, input: &AnalysisInput) -> Result<WasteAnalysis> {
        let body = match input {
            AnalysisInput::Image { data } => AnalysisRequest {
                image: Some(format!("data:image/jpeg;base64,{}", data)),
                description: None,
            },
            AnalysisInput::Description(text) => AnalysisRequest {
                image: None,
                description: Some(text.clone()),
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| WasteAiError::Service(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| WasteAiError::Service(e.to_string()))?;

        interpret_response(status.as_u16(), &text)
    }
}

/// サービスのレスポンスを解釈
pub fn interpret_response(status: u16, body: &str) -> Result<WasteAnalysis> {
    let parsed: AnalysisResponse = serde_json::from_str(body)
        .map_err(|_| WasteAiError::Service(format!("unexpected response (status {})", status)))?;

    match parsed {
        AnalysisResponse {
            success: true,
            analysis: Some(analysis),
            ..
        } => Ok(analysis),
        AnalysisResponse { error, .. } => Err(WasteAiError::Service(
            error.unwrap_or_else(|| format!("Analysis failed (status {})", status)),
        )),
    }
}
