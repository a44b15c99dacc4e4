//! Data URL ユーティリティ
//!
//! "data:image/jpeg;base64,/9j/4AAQ..." 形式の画像データを扱う

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Data URLからBase64データ部分を取り出す
///
/// プレフィックスが無い場合は入力をそのまま（前後空白除去のみ）返す。
///
/// # Examples
/// ```
/// use agri_waste_common::data_url::strip_prefix;
///
/// assert_eq!(strip_prefix("data:image/png;base64,iVBORw0"), "iVBORw0");
/// assert_eq!(strip_prefix("iVBORw0"), "iVBORw0");
/// ```
pub fn strip_prefix(data_url: &str) -> &str {
    let trimmed = data_url.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, data)) = trimmed.split_once(',') {
            return data.trim();
        }
    }
    trimmed
}

/// バイト列からData URLを生成
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Data URL（またはプレフィックスなしのBase64）を検証し、Base64部分を返す
pub fn to_base64_payload(data_url: &str) -> Result<String> {
    let data = strip_prefix(data_url);
    if data.is_empty() {
        return Err(Error::InvalidInput("image data is empty".into()));
    }
    STANDARD
        .decode(data)
        .map_err(|e| Error::InvalidInput(format!("image is not valid base64: {}", e)))?;
    Ok(data.to_string())
}
