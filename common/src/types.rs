//! 解析結果の型定義
//!
//! サービスとクライアントで共有される型:
//! - WasteAnalysis: 正規化済みの廃棄物解析結果
//! - Breakdown: 文字列または項目別マップ（marketValue / environmentalImpact）
//! - AnalysisInput: 解析対象（画像 or テキスト説明）
//! - AnalysisRequest / AnalysisResponse: サービスの入出力

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 廃棄物種別が判定できなかった場合の値
pub const UNKNOWN_WASTE_TYPE: &str = "Unknown";

/// 文字列か項目別の内訳か
///
/// モデルの出力は `"₹2000/ton"` のような単一文字列のこともあれば、
/// `{"Fodder": "₹1500/ton", "Biochar": "₹4000/ton"}` のような内訳のこともある。
/// どちらになるかは正規化パイプラインが一度だけ決める。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Breakdown {
    Text(String),
    Keyed(BTreeMap<String, String>),
}

impl Breakdown {
    pub fn text(value: impl Into<String>) -> Self {
        Breakdown::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Breakdown::Text(s) => s.trim().is_empty(),
            Breakdown::Keyed(map) => map.is_empty(),
        }
    }
}

/// 正規化済みの解析結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteAnalysis {
    pub waste_type: String,
    pub recycling_methods: Vec<String>,
    pub market_value: Breakdown,
    pub interested_industries: Vec<String>,
    pub environmental_impact: Breakdown,
}

/// 解析対象
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInput {
    /// Base64画像データ（data URIプレフィックス除去済み）
    Image { data: String },
    /// 廃棄物のテキスト説明
    Description(String),
}

impl AnalysisInput {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisInput::Image { .. } => "image",
            AnalysisInput::Description(_) => "description",
        }
    }
}

/// サービスへのリクエストボディ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    pub image: Option<String>,
    pub description: Option<String>,
}

/// サービスからのレスポンスボディ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<WasteAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn ok(analysis: WasteAnalysis) -> Self {
        Self {
            success: true,
            analysis: Some(analysis),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            analysis: None,
            error: Some(message.into()),
        }
    }
}
