//! プロンプト生成モジュール
//!
//! サービスとクライアントで共有されるプロンプト生成ロジック:
//! - ANALYSIS_PROMPT: 固定の指示文（出力5項目を列挙）
//! - AnalysisInput::from_request: 入力の検証
//! - build_prompt / build_request: Gemini リクエストの組み立て

use crate::data_url;
use crate::error::{Error, Result};
use crate::gemini::{Content, GeminiRequest, GenerationConfig, InlineData, Part, IMAGE_MIME_TYPE};
use crate::types::AnalysisInput;

/// 出力形式として要求するキー
pub const ANALYSIS_FIELDS: &[&str] = &[
    "wasteType",
    "recyclingMethods",
    "marketValue",
    "interestedIndustries",
    "environmentalImpact",
];

/// 固定の指示文
pub const ANALYSIS_PROMPT: &str = r#"You are an agricultural waste expert. Analyze the provided waste and provide:
1. Waste type identification
2. Suggested recycling/reuse methods
3. Potential market value (in Indian Rupees per ton)
4. Industries that might be interested
5. Environmental impact of recycling vs burning

Format your response as JSON with these exact keys:
- wasteType
- recyclingMethods (array)
- marketValue
- interestedIndustries (array)
- environmentalImpact

"#;

/// 生成パラメータ
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { temperature: 0.4 }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl AnalysisInput {
    /// リクエストの image / description から解析対象を決める
    ///
    /// 空白のみの値は未指定扱い。両方ある場合は画像を優先する。
    /// どちらも無ければ `Error::InvalidInput`。
    pub fn from_request(image: Option<&str>, description: Option<&str>) -> Result<Self> {
        if let Some(image) = non_blank(image) {
            let data = data_url::to_base64_payload(image)?;
            return Ok(AnalysisInput::Image { data });
        }

        if let Some(text) = non_blank(description) {
            return Ok(AnalysisInput::Description(text.to_string()));
        }

        Err(Error::InvalidInput(
            "Either image or description is required".into(),
        ))
    }
}

/// 指示文を生成
///
/// テキスト説明の場合のみ末尾に説明文を付加する
pub fn build_prompt(input: &AnalysisInput) -> String {
    match input {
        AnalysisInput::Image { .. } => ANALYSIS_PROMPT.to_string(),
        AnalysisInput::Description(text) => {
            format!("{}\nWaste description: {}", ANALYSIS_PROMPT, text)
        }
    }
}

/// Gemini リクエストを組み立てる
pub fn build_request(input: &AnalysisInput, settings: &GenerationSettings) -> GeminiRequest {
    let mut parts = vec![Part::Text {
        text: build_prompt(input),
    }];

    if let AnalysisInput::Image { data } = input {
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: IMAGE_MIME_TYPE.to_string(),
                data: data.clone(),
            },
        });
    }

    GeminiRequest {
        contents: vec![Content { parts }],
        generation_config: Some(GenerationConfig {
            temperature: settings.temperature,
            response_mime_type: "application/json".to_string(),
        }),
    }
}
