//! 遊戲伺服器連線設定
//!
//! 設定以 JSON 檔載入，缺少的欄位取預設值，再套用環境變數覆寫：
//! - `GAME_SERVER_HOST`
//! - `GAME_SERVER_PORT`
//! - `GAME_SERVER_TELNET_PORT`
//! - `GAME_SERVER_ADMIN_PASSWORD`

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::telnet::SessionOptions;

/// 遊戲連線埠預設值
pub const DEFAULT_GAME_PORT: u16 = 26900;
/// Telnet 管理埠預設值
pub const DEFAULT_TELNET_PORT: u16 = 8081;

/// 設定錯誤
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("讀取設定檔失敗: {0}")]
    Io(#[from] io::Error),

    #[error("設定檔格式錯誤: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("設定值無效: {0}")]
    Invalid(String),
}

/// 主控台各階段的逾時設定（毫秒）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleTimeouts {
    /// DNS 解析加 TCP 連線
    pub connect_timeout_ms: u64,
    /// 歡迎訊息、驗證回應與寫入
    pub banner_timeout_ms: u64,
    /// 命令回應的靜默判定時間；慢速連線可能需要調高
    pub inactivity_timeout_ms: u64,
    /// 收集命令回應的總時限；主控台持續輸出日誌時以此結束
    pub response_deadline_ms: u64,
    /// 遊戲埠可達性探測
    pub probe_timeout_ms: u64,
}

impl Default for ConsoleTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            banner_timeout_ms: 10_000,
            inactivity_timeout_ms: 200,
            response_deadline_ms: 10_000,
            probe_timeout_ms: 5_000,
        }
    }
}

impl ConsoleTimeouts {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn banner(&self) -> Duration {
        Duration::from_millis(self.banner_timeout_ms)
    }

    pub fn inactivity(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    pub fn response_deadline(&self) -> Duration {
        Duration::from_millis(self.response_deadline_ms)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// 遊戲伺服器連線設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameServerConfig {
    /// 遊戲伺服器主機名稱或 IP
    pub host: String,
    /// 玩家連線用的遊戲埠
    pub port: u16,
    /// Telnet 管理主控台埠
    pub telnet_port: u16,
    /// 主控台管理密碼
    pub admin_password: String,
    pub timeouts: ConsoleTimeouts,
}

impl Default for GameServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_GAME_PORT,
            telnet_port: DEFAULT_TELNET_PORT,
            admin_password: String::new(),
            timeouts: ConsoleTimeouts::default(),
        }
    }
}

impl GameServerConfig {
    /// 從 JSON 檔載入，套用環境變數後驗證
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// 同 [`GameServerConfig::load`]，環境變數改由 `lookup` 提供
    pub fn load_with<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        info!("已載入設定檔 {:?}", path);

        config.apply_env_overrides_from(lookup);
        config.validate()?;
        Ok(config)
    }

    /// 以預設值為基礎，只從環境變數建立設定
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// 套用環境變數覆寫；無法解析的埠號會被忽略
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("GAME_SERVER_HOST") {
            self.host = host;
        }

        if let Some(port) = lookup("GAME_SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("GAME_SERVER_PORT 無效，忽略: {}", port),
            }
        }

        if let Some(port) = lookup("GAME_SERVER_TELNET_PORT") {
            match port.parse() {
                Ok(port) => self.telnet_port = port,
                Err(_) => warn!("GAME_SERVER_TELNET_PORT 無效，忽略: {}", port),
            }
        }

        if let Some(password) = lookup("GAME_SERVER_ADMIN_PASSWORD") {
            self.admin_password = password;
        }
    }

    /// 驗證設定
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host 不可為空".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port 必須大於 0".to_string()));
        }
        if self.telnet_port == 0 {
            return Err(ConfigError::Invalid("telnet_port 必須大於 0".to_string()));
        }
        if self.timeouts.inactivity_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "inactivity_timeout_ms 必須大於 0".to_string(),
            ));
        }
        if self.timeouts.response_deadline_ms == 0 {
            return Err(ConfigError::Invalid(
                "response_deadline_ms 必須大於 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 建立主控台 Session 參數
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            admin_password: self.admin_password.clone(),
            banner_timeout: self.timeouts.banner(),
            inactivity_timeout: self.timeouts.inactivity(),
            response_deadline: self.timeouts.response_deadline(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = GameServerConfig::default();
        assert_eq!(config.port, 26900);
        assert_eq!(config.telnet_port, 8081);
        assert!(config.host.is_empty());
        assert_eq!(config.timeouts.inactivity(), Duration::from_millis(200));
        assert_eq!(config.timeouts.probe(), Duration::from_secs(5));
    }

    #[test]
    fn test_json_missing_fields_use_defaults() {
        let config: GameServerConfig =
            serde_json::from_str(r#"{"host": "game.example.net", "admin_password": "pw"}"#).unwrap();
        assert_eq!(config.host, "game.example.net");
        assert_eq!(config.admin_password, "pw");
        assert_eq!(config.port, 26900);
        assert_eq!(config.telnet_port, 8081);
        assert_eq!(config.timeouts, ConsoleTimeouts::default());
    }

    #[test]
    fn test_json_partial_timeouts() {
        let config: GameServerConfig = serde_json::from_str(
            r#"{"host": "h", "timeouts": {"inactivity_timeout_ms": 750}}"#,
        )
        .unwrap();
        assert_eq!(config.timeouts.inactivity_timeout_ms, 750);
        assert_eq!(config.timeouts.connect_timeout_ms, 10_000);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GAME_SERVER_HOST", "10.0.0.5"),
            ("GAME_SERVER_PORT", "27000"),
            ("GAME_SERVER_TELNET_PORT", "not-a-port"),
            ("GAME_SERVER_ADMIN_PASSWORD", "hunter2"),
        ]
        .into_iter()
        .collect();

        let mut config = GameServerConfig::default();
        config.apply_env_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 27000);
        assert_eq!(config.telnet_port, 8081);
        assert_eq!(config.admin_password, "hunter2");
    }

    #[test]
    fn test_validate() {
        let mut config = GameServerConfig {
            host: "localhost".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.timeouts.inactivity_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.timeouts.inactivity_timeout_ms = 200;
        config.timeouts.response_deadline_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = GameServerConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("gamecore_config_{}.json", std::process::id()));
        fs::write(&path, r#"{"host": "file-host", "telnet_port": 9000}"#).unwrap();

        let config = GameServerConfig::load_with(&path, |_| None);
        let _ = fs::remove_file(&path);

        let config = config.unwrap();
        assert_eq!(config.host, "file-host");
        assert_eq!(config.telnet_port, 9000);
        assert_eq!(config.port, 26900);
        assert_eq!(config.timeouts, ConsoleTimeouts::default());
    }

    #[test]
    fn test_load_from_file_then_env() {
        let path = std::env::temp_dir().join(format!(
            "gamecore_config_env_{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{"host": "file-host", "admin_password": "from-file"}"#).unwrap();

        let env: HashMap<&str, &str> = [("GAME_SERVER_ADMIN_PASSWORD", "from-env")]
            .into_iter()
            .collect();
        let config = GameServerConfig::load_with(&path, |key| env.get(key).map(|v| v.to_string()));
        let _ = fs::remove_file(&path);

        let config = config.unwrap();
        assert_eq!(config.host, "file-host");
        assert_eq!(config.admin_password, "from-env");
    }

    #[test]
    fn test_load_missing_file() {
        let result = GameServerConfig::load("/nonexistent/gamecore/config.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_session_options() {
        let config = GameServerConfig {
            admin_password: "pw".to_string(),
            ..Default::default()
        };
        let options = config.session_options();
        assert_eq!(options.admin_password, "pw");
        assert_eq!(options.inactivity_timeout, Duration::from_millis(200));
        assert_eq!(options.banner_timeout, Duration::from_secs(10));
        assert_eq!(options.response_deadline, Duration::from_secs(10));
    }
}
