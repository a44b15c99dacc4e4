//! モデル応答の正規化パイプライン
//!
//! 外部モデルが返すテキストは純粋なJSONとは限らない:
//! - ```json ... ``` ブロックで囲まれている
//! - 閉じ括弧直前に余分なカンマがある
//! - フィールドの値がJSON文字列として入れ子になっている
//! - そもそもJSONではない説明文
//!
//! どの入力に対しても `WasteAnalysis` を返し、失敗しない。
//!
//! ## 処理フロー
//! 1. コードブロック抽出
//! 2. 末尾カンマ除去
//! 3. JSONデコード（失敗時は最外の {...} を再試行）
//! 4. デコード不能なら劣化レコードを合成
//! 5. 各フィールドの入れ子JSONを展開
//! 6. 形の確定・マーカー/波括弧の除去・短すぎる要素の除外

use crate::types::{Breakdown, WasteAnalysis, UNKNOWN_WASTE_TYPE};
use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// リスト要素として残す最小文字数（これ未満はJSON断片とみなす）
pub const MIN_ENTRY_CHARS: usize = 3;

/// 内訳フィールドが空の場合の値
pub const NOT_AVAILABLE: &str = "Not available";

const DEGRADED_MARKET_VALUE: &str = "Please see detailed analysis above";
const DEGRADED_INDUSTRY: &str = "Various industries";
const DEGRADED_IMPACT: &str = "Analysis provided above contains environmental benefits";
const EMPTY_RESPONSE_TEXT: &str = "The analysis service returned no details for this waste.";

lazy_static::lazy_static! {
    static ref FENCE_RE: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").unwrap();
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();
    static ref FENCE_MARKER_RE: Regex = Regex::new(r"```(?:json|JSON)?").unwrap();
    static ref BRACE_RE: Regex = Regex::new(r"[{}]").unwrap();
}

/// 解析結果の品質
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseQuality {
    /// JSONとして解釈できた
    Structured,
    /// JSONとして解釈できず、生テキストから合成した
    Degraded,
}

/// コードブロックの中身を取り出す
///
/// ブロックが無ければ前後空白を除いた入力を返す
///
/// # Examples
/// ```
/// use agri_waste_common::parser::extract_fenced;
///
/// assert_eq!(extract_fenced("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(extract_fenced(" {\"a\": 1} "), "{\"a\": 1}");
/// ```
pub fn extract_fenced(text: &str) -> &str {
    FENCE_RE
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| text.trim())
}

/// `}` / `]` 直前の余分なカンマを除去
pub fn strip_trailing_commas(text: &str) -> Cow<'_, str> {
    TRAILING_COMMA_RE.replace_all(text, "$1")
}

/// 表示用文字列からコードブロック記号と波括弧を除去
///
/// 除去が発生した場合のみ前後の空白を詰める。記号を含まない値はそのまま返す
pub fn clean_text(text: &str) -> String {
    let without_fences = FENCE_MARKER_RE.replace_all(text, "");
    let cleaned = BRACE_RE.replace_all(&without_fences, "");
    if cleaned.len() == text.len() {
        text.to_string()
    } else {
        cleaned.trim().to_string()
    }
}

/// 生テキストを正規化する
pub fn normalize_response(raw: &str) -> WasteAnalysis {
    normalize_with_quality(raw).0
}

/// 生テキストを正規化し、構造化できたかどうかも返す
pub fn normalize_with_quality(raw: &str) -> (WasteAnalysis, ParseQuality) {
    match parse_record(raw) {
        Some(record) => (normalize_record(record), ParseQuality::Structured),
        None => (degraded(raw), ParseQuality::Degraded),
    }
}

/// デコード済みのオブジェクトを正規化する
pub fn normalize_record(mut record: Map<String, Value>) -> WasteAnalysis {
    let waste_type = take_field(&mut record, "wasteType");
    let recycling = take_field(&mut record, "recyclingMethods");
    let market = take_field(&mut record, "marketValue");
    let industries = take_field(&mut record, "interestedIndustries");
    let impact = take_field(&mut record, "environmentalImpact");

    WasteAnalysis {
        waste_type: to_waste_type(waste_type),
        recycling_methods: to_list(unwrap_nested(recycling, "recyclingMethods")),
        market_value: to_breakdown(unwrap_nested(market, "marketValue")),
        interested_industries: to_list(unwrap_nested(industries, "interestedIndustries")),
        environmental_impact: to_breakdown(unwrap_nested(impact, "environmentalImpact")),
    }
}

/// JSONとして解釈できなかったテキストから劣化レコードを作る
pub fn degraded(raw: &str) -> WasteAnalysis {
    let text = clean_text(raw).trim().to_string();
    let summary = if text.is_empty() {
        EMPTY_RESPONSE_TEXT.to_string()
    } else {
        text
    };

    WasteAnalysis {
        waste_type: UNKNOWN_WASTE_TYPE.to_string(),
        recycling_methods: vec![summary],
        market_value: Breakdown::text(DEGRADED_MARKET_VALUE),
        interested_industries: vec![DEGRADED_INDUSTRY.to_string()],
        environmental_impact: Breakdown::text(DEGRADED_IMPACT),
    }
}

// =============================================
// デコード
// =============================================

fn parse_record(raw: &str) -> Option<Map<String, Value>> {
    into_record(decode_value(raw, true)?, 1)
}

/// トップレベル値をレコードとして解釈
///
/// 1要素目がオブジェクトの配列や、JSON文字列として二重にエンコードされた値も受け付ける
fn into_record(value: Value, depth: u8) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        },
        Value::String(s) if depth > 0 => into_record(decode_value(&s, true)?, depth - 1),
        _ => None,
    }
}

/// `outer_braces` が真なら、全体が解釈できないとき最も外側の {...} も試す
fn decode_value(text: &str, outer_braces: bool) -> Option<Value> {
    let fenced = extract_fenced(text);
    let whole = text.trim();
    decode_candidate(fenced, outer_braces).or_else(|| {
        // 値の中に ``` が含まれていただけの場合は全体で再試行
        if fenced != whole {
            decode_candidate(whole, outer_braces)
        } else {
            None
        }
    })
}

fn decode_candidate(text: &str, outer_braces: bool) -> Option<Value> {
    let cleaned = strip_trailing_commas(text);
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Some(value);
    }
    if !outer_braces {
        return None;
    }

    // 前後に説明文が付いている場合は最も外側の {...} を試す
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&cleaned[start..=end]).ok()
}

/// キー表記の揺れ（wasteType / waste_type / Waste Type）を吸収して取り出す
fn take_field(record: &mut Map<String, Value>, name: &str) -> Option<Value> {
    if let Some(value) = record.remove(name) {
        return Some(value);
    }
    let wanted = key_signature(name);
    let key = record.keys().find(|k| key_signature(k) == wanted)?.clone();
    record.remove(&key)
}

fn key_signature(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 文字列値に埋め込まれたJSONを展開
///
/// `{"environmentalImpact": ...}` のように同名キーで包まれていれば中身を取り出す。
/// 文字列全体がJSONの場合のみ展開し、前後の説明文は捨てない
fn unwrap_nested(value: Option<Value>, field: &str) -> Option<Value> {
    let value = value?;
    let decoded = match &value {
        Value::String(s) if s.contains('{') => decode_value(s, false),
        _ => None,
    };

    match decoded {
        Some(Value::Object(mut map)) => Some(take_field(&mut map, field).unwrap_or(Value::Object(map))),
        Some(other) => Some(other),
        None => Some(value),
    }
}

// =============================================
// 形の確定
// =============================================

fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, to_text(v)))
            .collect::<Vec<_>>()
            .join("; "),
    }
}

fn to_waste_type(value: Option<Value>) -> String {
    value
        .map(|v| clean_text(&to_text(&v)))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_WASTE_TYPE.to_string())
}

fn to_list(value: Option<Value>) -> Vec<String> {
    let entries: Vec<String> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(to_text).collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, to_text(v)))
            .collect(),
        Some(other) => vec![to_text(&other)],
    };

    entries
        .iter()
        .map(|entry| clean_text(entry))
        .filter(|entry| entry.trim().chars().count() >= MIN_ENTRY_CHARS)
        .collect()
}

fn to_breakdown(value: Option<Value>) -> Breakdown {
    let breakdown = match value {
        None | Some(Value::Null) => Breakdown::text(NOT_AVAILABLE),
        Some(Value::Object(map)) => Breakdown::Keyed(
            map.iter()
                .map(|(k, v)| (clean_text(k), clean_text(&to_text(v))))
                .filter(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty())
                .collect(),
        ),
        Some(other) => Breakdown::Text(clean_text(&to_text(&other))),
    };

    if breakdown.is_empty() {
        Breakdown::text(NOT_AVAILABLE)
    } else {
        breakdown
    }
}
