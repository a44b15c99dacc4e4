//! Agri Waste AI Common Library
//!
//! サービスとクライアントで共有される型と正規化ロジック

pub mod types;
pub mod error;
pub mod data_url;
pub mod gemini;
pub mod prompts;
pub mod parser;
pub mod render;
pub mod requester;

pub use types::{AnalysisInput, AnalysisRequest, AnalysisResponse, Breakdown, WasteAnalysis, UNKNOWN_WASTE_TYPE};
pub use error::{Error, Result};
pub use gemini::{extract_text, GeminiRequest};
pub use prompts::{build_prompt, build_request, GenerationSettings, ANALYSIS_PROMPT};
pub use parser::{normalize_response, normalize_with_quality, ParseQuality};
pub use render::render_text;
pub use requester::{AnalysisRequester, CaptureDevice, MediaStream, NoCamera, RequesterError, RequesterState};
