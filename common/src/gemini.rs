//! Gemini API ワイヤ型
//!
//! generateContent のリクエスト/レスポンス構造。
//! HTTP呼び出し自体はクレート外（サービス側）で行う。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 画像パートのMIMEタイプ（常にJPEGとして送る）
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Gemini APIリクエスト
#[derive(Debug, Clone, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "responseMimeType")]
    pub response_mime_type: String,
}

/// Gemini APIレスポンス
///
/// 想定外の構造を検出するため全フィールドを省略可能にしている
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// レスポンスボディから最初の候補テキストを取り出す
///
/// `candidates[0].content.parts[0].text` が無ければ `Error::Parse`
pub fn extract_text(body: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(body)?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("response has no candidates".into()))?;

    let content = candidate
        .content
        .ok_or_else(|| Error::Parse("candidate has no content".into()))?;

    content
        .parts
        .into_iter()
        .next()
        .and_then(|p| p.text)
        .ok_or_else(|| Error::Parse("content has no text part".into()))
}
