//! 廃棄物解析
//!
//! プロンプト構築 → 外部モデル呼び出し → 応答の正規化

mod gemini_client;

pub use gemini_client::GeminiClient;

use crate::error::{Result, WasteAiError};
use agri_waste_common::{
    build_request, normalize_with_quality, AnalysisInput, GeminiRequest, GenerationSettings,
    ParseQuality, WasteAnalysis,
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// 外部生成モデル
///
/// 成功時は最初の候補テキストをそのまま返す
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, request: &GeminiRequest) -> Result<String>;
}

/// APIキー未設定時のモデル
///
/// サービス自体は起動し、解析要求には `MissingApiKey` を返す
pub struct UnconfiguredModel;

#[async_trait]
impl ModelClient for UnconfiguredModel {
    async fn generate(&self, _request: &GeminiRequest) -> Result<String> {
        Err(WasteAiError::MissingApiKey)
    }
}

/// 1件の入力を解析する
///
/// 上流の失敗はそのまま返す（再試行しない）。応答がJSONとして
/// 解釈できない場合は劣化レコードを返し、エラーにはしない。
pub async fn analyze(
    client: &dyn ModelClient,
    input: &AnalysisInput,
    settings: &GenerationSettings,
) -> Result<WasteAnalysis> {
    let label = input_label(input);
    tracing::info!(input = %label, "解析開始");

    let request = build_request(input, settings);
    let raw = client.generate(&request).await?;

    let (analysis, quality) = normalize_with_quality(&raw);
    if quality == ParseQuality::Degraded {
        let preview: String = raw.chars().take(200).collect();
        tracing::warn!(input = %label, response = %preview, "JSONとして解釈できず劣化レコードで応答");
    }

    tracing::info!(input = %label, waste_type = %analysis.waste_type, "解析完了");
    Ok(analysis)
}

/// ログ用の入力識別子（画像本体は出さずダイジェストのみ）
pub fn input_label(input: &AnalysisInput) -> String {
    match input {
        AnalysisInput::Image { data } => {
            let digest = Sha256::digest(data.as_bytes());
            format!("image:{}", &hex::encode(digest)[..12])
        }
        AnalysisInput::Description(text) => format!("description:{}chars", text.chars().count()),
    }
}
