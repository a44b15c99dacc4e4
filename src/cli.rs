use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agri-waste")]
#[command(about = "農業廃棄物AI識別サービス・クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 解析サービスを起動
    Serve {
        /// 待ち受けアドレス（例: 0.0.0.0:8787）
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// 廃棄物を解析して結果を表示（引数なしで対話モード）
    Analyze {
        /// 画像ファイル
        #[arg(short, long, conflicts_with = "description")]
        image: Option<PathBuf>,

        /// 廃棄物のテキスト説明
        #[arg(short, long)]
        description: Option<String>,

        /// 解析サービスのURL（未指定なら設定値、それも無ければGeminiを直接呼ぶ）
        #[arg(long)]
        service_url: Option<String>,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 設定
    Config {
        /// Gemini APIキーを保存
        #[arg(long)]
        set_api_key: Option<String>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}
