use agri_waste_ai::{cli, config, requester, server};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use requester::{Backend, TerminalRequester, Trigger};
use std::sync::Arc;

/// ログ出力を初期化（RUST_LOG があれば優先）
fn init_tracing(default_filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => {
            init_tracing(if cli.verbose {
                "agri_waste_ai=debug,tower_http=debug"
            } else {
                "agri_waste_ai=info,tower_http=info"
            });

            let mut config = Config::load()?;
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            server::run_server(Arc::new(config)).await?;
        }

        Commands::Analyze { image, description, service_url, json } => {
            init_tracing(if cli.verbose { "agri_waste_ai=debug" } else { "warn" });

            let config = Config::load()?;
            let backend = Backend::from_config(&config, service_url.as_deref())?;
            let mut terminal = TerminalRequester::new(&config, backend, json);

            match (image, description) {
                (Some(path), _) => terminal.run_once(Trigger::Image(path)).await?,
                (None, Some(text)) => terminal.run_once(Trigger::Description(text)).await?,
                (None, None) => {
                    println!("🌾 agri-waste - 農業廃棄物AI識別\n");
                    terminal.run_interactive().await?;
                }
            }
        }

        Commands::Config { set_api_key, show } => {
            // 環境変数の値をファイルへ書き戻さないよう、ファイルのみから読む
            let path = Config::config_path()?;
            let mut config = Config::load_from(&path)?;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました: {}", path.display());
            }

            if show {
                let api_key_set = Config::load()?.get_api_key().is_ok();
                println!("設定: {}", path.display());
                println!("  モデル: {}", config.model);
                println!("  APIエンドポイント: {}", config.api_base_url);
                println!("  temperature: {}", config.temperature);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  最大画像サイズ: {}px", config.max_image_size);
                println!("  待ち受けアドレス: {}", config.bind_address);
                println!("  解析サービスURL: {}", config.service_url.as_deref().unwrap_or("(未設定)"));
                println!("  APIキー: {}", if api_key_set { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}
