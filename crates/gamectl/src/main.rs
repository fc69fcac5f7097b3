//! 遊戲伺服器主控台命令列工具

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gamecore::{GameConsoleClient, GameServerConfig};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gamectl", version, about = "查詢遊戲伺服器的 Telnet 管理主控台")]
struct Cli {
    /// 設定檔路徑（預設為使用者設定目錄下的 gamectl/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 查詢遊戲內時間
    Time,
    /// 列出在線玩家
    Players,
    /// 探測遊戲埠是否可連線
    Probe {
        /// 主機（預設取設定檔）
        #[arg(long)]
        host: Option<String>,
        /// 連接埠（預設取設定檔）
        #[arg(long)]
        port: Option<u16>,
    },
    /// 執行任意主控台命令並輸出原始回應
    Exec {
        command: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化日誌
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("設定載入失敗: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let client = GameConsoleClient::new(config);

    let output = match cli.command {
        Command::Time => client
            .get_game_time()
            .await
            .map(|snapshot| json!(snapshot)),
        Command::Players => client.list_players().await.map(|players| json!(players)),
        Command::Probe { host, port } => {
            let host = host.unwrap_or_else(|| client.config().host.clone());
            let port = port.unwrap_or(client.config().port);
            let open = client.is_game_port_open(&host, port).await;
            Ok(json!({ "host": host, "port": port, "open": open }))
        }
        Command::Exec { command } => client
            .send_command(&command)
            .await
            .map(|output| json!({ "command": command, "response": output.response })),
    };

    match output {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("輸出序列化失敗: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("{}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

/// 指定路徑時必須存在；未指定時嘗試預設路徑，不存在則只用環境變數
fn load_config(path: Option<PathBuf>) -> Result<GameServerConfig, gamecore::ConfigError> {
    if let Some(path) = path {
        return GameServerConfig::load(path);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        tracing::info!("使用預設設定檔 {:?}", default_path);
        GameServerConfig::load(default_path)
    } else {
        GameServerConfig::from_env()
    }
}

/// 獲取預設設定檔路徑
fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("gamectl").join("config.json"),
        None => PathBuf::from("gamectl.json"),
    }
}

/// 將錯誤與其所有來源串成一行
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_probe_args() {
        let cli = Cli::try_parse_from(["gamectl", "probe", "--host", "h", "--port", "26901"]).unwrap();
        match cli.command {
            Command::Probe { host, port } => {
                assert_eq!(host.as_deref(), Some("h"));
                assert_eq!(port, Some(26901));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::try_parse_from(["gamectl", "time", "--config", "/tmp/c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        assert!(matches!(cli.command, Command::Time));
    }

    #[test]
    fn test_default_config_path() {
        assert!(default_config_path().ends_with("config.json") || default_config_path().ends_with("gamectl.json"));
    }
}
