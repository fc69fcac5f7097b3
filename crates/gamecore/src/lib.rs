//! Game Server Core Library
//!
//! 提供遊戲伺服器管理的核心功能：
//! - `telnet`: Telnet 管理主控台 Session（連線、驗證、命令往返）
//! - `parser`: 主控台回應解析（遊戲時間、在線玩家）
//! - `probe`: 遊戲埠 TCP 可達性探測
//! - `client`: 組合以上功能的主控台客戶端
//! - `config`: 連線設定與逾時
//! - `encoding`: 主控台文字編解碼
//! - `models`: 查詢結果與 VM 狀態
//! - `vm`: VM 電源狀態來源介面

pub mod client;
pub mod config;
pub mod encoding;
pub mod models;
pub mod parser;
pub mod probe;
pub mod telnet;
pub mod vm;

pub use client::{GameConsoleClient, GameServerError, GET_TIME_COMMAND, LIST_PLAYERS_COMMAND};
pub use config::{ConfigError, ConsoleTimeouts, GameServerConfig};
pub use models::{GameTimeSnapshot, PlayerRecord, VmState, VmStatus};
pub use parser::{parse_game_time, parse_players, try_parse_game_time};
pub use probe::{probe, ReachabilityProbe, TcpPortProbe};
pub use telnet::{CommandOutput, ConsoleError, SessionOptions, SessionState, TelnetSession};
pub use vm::{PowerStateProvider, VmError};
