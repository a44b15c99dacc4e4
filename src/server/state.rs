//! アプリケーション状態

use crate::analyzer::ModelClient;
use agri_waste_common::GenerationSettings;
use std::sync::Arc;

/// ハンドラ間で共有する状態（リクエスト間で可変状態は持たない）
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn ModelClient>,
    pub settings: GenerationSettings,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(model: Arc<dyn ModelClient>, settings: GenerationSettings, max_body_bytes: usize) -> Self {
        Self {
            model,
            settings,
            max_body_bytes,
        }
    }
}
