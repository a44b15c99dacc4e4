use axum::http::StatusCode;
use thiserror::Error;

/// 解析失敗時にクライアントへ返す文言
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze waste";

#[derive(Error, Debug)]
pub enum WasteAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。環境変数 GEMINI_API_KEY か `agri-waste config --set-api-key YOUR_KEY` で設定してください")]
    MissingApiKey,

    #[error("入力エラー: {0}")]
    InvalidInput(String),

    #[error("AI API呼び出しエラー: {0}")]
    Upstream(String),

    #[error("AI APIレスポンスの構造が不正: {0}")]
    MalformedUpstreamResponse(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("解析サービスエラー: {0}")]
    Service(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(agri_waste_common::Error),
}

impl From<agri_waste_common::Error> for WasteAiError {
    fn from(err: agri_waste_common::Error) -> Self {
        match err {
            agri_waste_common::Error::InvalidInput(msg) => WasteAiError::InvalidInput(msg),
            other => WasteAiError::Common(other),
        }
    }
}

impl WasteAiError {
    /// サービスのHTTPステータス
    pub fn status_code(&self) -> StatusCode {
        match self {
            WasteAiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WasteAiError::Upstream(_) | WasteAiError::MalformedUpstreamResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// クライアントに見せる文言（内部情報・資格情報を含めない）
    pub fn user_message(&self) -> String {
        match self {
            WasteAiError::InvalidInput(msg) => msg.clone(),
            WasteAiError::Upstream(_) | WasteAiError::MalformedUpstreamResponse(_) => {
                ANALYSIS_FAILED_MESSAGE.to_string()
            }
            WasteAiError::MissingApiKey | WasteAiError::Config(_) => {
                "Analysis service is not configured".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WasteAiError>;

impl From<agri_waste_common::RequesterError> for WasteAiError {
    fn from(err: agri_waste_common::RequesterError) -> Self {
        match err {
            agri_waste_common::RequesterError::Input(e) => e.into(),
            other => WasteAiError::InvalidInput(other.to_string()),
        }
    }
}

impl From<dialoguer::Error> for WasteAiError {
    fn from(err: dialoguer::Error) -> Self {
        WasteAiError::Io(std::io::Error::other(err))
    }
}
