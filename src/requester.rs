//! 端末版の解析リクエスタ
//!
//! 画像ファイル or テキスト説明 → 解析中スピナー → 結果表示。
//! 対話モードでは結果を破棄して次の解析をやり直せる。

use crate::analyzer::{self, GeminiClient};
use crate::client::{self, ServiceClient};
use crate::config::Config;
use crate::error::{Result, WasteAiError};
use agri_waste_common::{
    render_text, AnalysisInput, AnalysisRequester, GenerationSettings, NoCamera, RequesterState,
    WasteAnalysis,
};
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// 解析の実行先
pub enum Backend {
    /// リモートの解析サービス
    Remote(ServiceClient),
    /// このプロセス内で Gemini を直接呼ぶ
    Local {
        model: GeminiClient,
        settings: GenerationSettings,
    },
}

impl Backend {
    pub fn from_config(config: &Config, service_url: Option<&str>) -> Result<Self> {
        match service_url.or(config.service_url.as_deref()) {
            Some(url) => Ok(Backend::Remote(ServiceClient::new(
                url,
                Duration::from_secs(config.timeout_seconds),
            )?)),
            None => Ok(Backend::Local {
                model: GeminiClient::new(config)?,
                settings: config.generation_settings(),
            }),
        }
    }

    pub async fn analyze(&self, input: &AnalysisInput) -> Result<WasteAnalysis> {
        match self {
            Backend::Remote(client) => client.analyze(input).await,
            Backend::Local { model, settings } => analyzer::analyze(model, input, settings).await,
        }
    }
}

/// 解析のきっかけ
pub enum Trigger {
    Image(PathBuf),
    Description(String),
}

pub struct TerminalRequester<'a> {
    config: &'a Config,
    backend: Backend,
    requester: AnalysisRequester<NoCamera>,
    json: bool,
}

impl<'a> TerminalRequester<'a> {
    pub fn new(config: &'a Config, backend: Backend, json: bool) -> Self {
        Self {
            config,
            backend,
            requester: AnalysisRequester::new(NoCamera),
            json,
        }
    }

    /// 1回だけ解析して表示する
    pub async fn run_once(&mut self, trigger: Trigger) -> Result<()> {
        self.analyze(trigger).await?;
        match self.requester.state() {
            RequesterState::Failed(message) => Err(WasteAiError::Service(message.clone())),
            _ => {
                self.show();
                Ok(())
            }
        }
    }

    /// 対話モード
    pub async fn run_interactive(&mut self) -> Result<()> {
        loop {
            let choice = Select::new()
                .with_prompt("解析方法を選択")
                .items(&["画像をアップロード", "テキストで説明", "終了"])
                .default(0)
                .interact()?;

            let trigger = match choice {
                0 => {
                    let path = Input::<String>::new().with_prompt("画像ファイルのパス").interact_text()?;
                    Trigger::Image(PathBuf::from(path.trim()))
                }
                1 => {
                    let text = Input::<String>::new().with_prompt("廃棄物の説明").interact_text()?;
                    Trigger::Description(text)
                }
                _ => return Ok(()),
            };

            match self.analyze(trigger).await {
                Ok(()) => self.show(),
                Err(e) => println!("❌ {}", e),
            }

            let again = Confirm::new()
                .with_prompt("別の廃棄物を解析しますか？")
                .default(true)
                .interact()?;
            self.requester.reset();
            if !again {
                return Ok(());
            }
            println!();
        }
    }

    async fn analyze(&mut self, trigger: Trigger) -> Result<()> {
        let input = match trigger {
            Trigger::Image(path) => {
                let data_url = client::load_image_data_url(&path, self.config.max_image_size)?;
                self.requester.select_image(data_url)?
            }
            Trigger::Description(text) => self.requester.describe(&text)?,
        };

        let spinner = analyzing_spinner(self.json);
        let outcome = self.backend.analyze(&input).await;
        spinner.finish_and_clear();

        self.requester
            .finish(outcome.map_err(|e| match e {
                WasteAiError::Service(message) => message,
                other => other.to_string(),
            }));
        Ok(())
    }

    fn show(&self) {
        match self.requester.state() {
            RequesterState::Done(analysis) => {
                if self.json {
                    match serde_json::to_string_pretty(analysis) {
                        Ok(json) => println!("{}", json),
                        Err(e) => eprintln!("❌ JSON出力エラー: {}", e),
                    }
                } else {
                    println!("✔ 解析完了\n");
                    print!("{}", render_text(analysis));
                }
            }
            RequesterState::Failed(message) => {
                eprintln!("❌ 解析失敗: {}", message);
            }
            _ => {}
        }
    }
}

fn analyzing_spinner(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("廃棄物を解析中...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
