//! 遊戲主控台客戶端
//!
//! 對外提供查詢遊戲時間、玩家清單與遊戲埠可達性。每次查詢都建立新的
//! Telnet Session，送出一個命令後即關閉，呼叫之間不共用任何狀態。

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::config::GameServerConfig;
use crate::models::{GameTimeSnapshot, PlayerRecord, VmState, VmStatus};
use crate::parser::{parse_game_time, parse_players};
use crate::probe::{ReachabilityProbe, TcpPortProbe};
use crate::telnet::{CommandOutput, ConsoleError, TelnetSession};
use crate::vm::{PowerStateProvider, VmError};

/// 查詢遊戲時間的主控台命令
pub const GET_TIME_COMMAND: &str = "gettime";
/// 列出在線玩家的主控台命令
pub const LIST_PLAYERS_COMMAND: &str = "listplayers";

/// 遊戲伺服器錯誤
#[derive(Debug, Error)]
pub enum GameServerError {
    #[error("遊戲伺服器無法連線（命令: {command}）: {source}")]
    Unreachable {
        command: String,
        #[source]
        source: ConsoleError,
    },
}

/// 遊戲主控台客戶端
pub struct GameConsoleClient {
    config: GameServerConfig,
    probe: Arc<dyn ReachabilityProbe>,
}

impl GameConsoleClient {
    /// 以實際 TCP 探測建立客戶端
    pub fn new(config: GameServerConfig) -> Self {
        Self::with_probe(config, Arc::new(TcpPortProbe))
    }

    /// 指定可達性探測實作
    pub fn with_probe(config: GameServerConfig, probe: Arc<dyn ReachabilityProbe>) -> Self {
        Self { config, probe }
    }

    pub fn config(&self) -> &GameServerConfig {
        &self.config
    }

    /// 對主控台執行任意命令並回傳原始輸出
    ///
    /// 連線或傳輸失敗時回傳 [`GameServerError::Unreachable`]，不會自動重試。
    pub async fn send_command(&self, command: &str) -> Result<CommandOutput, GameServerError> {
        let result = async {
            let session = TelnetSession::connect(
                &self.config.host,
                self.config.telnet_port,
                self.config.timeouts.connect(),
                self.config.session_options(),
            )
            .await?;
            session.run(command).await
        }
        .await;

        result.map_err(|source| {
            error!("主控台命令 {} 執行失敗: {}", command, source);
            GameServerError::Unreachable {
                command: command.to_string(),
                source,
            }
        })
    }

    /// 查詢遊戲內時間
    ///
    /// 回應無法解析時回傳預設快照，不視為錯誤。
    pub async fn get_game_time(&self) -> Result<GameTimeSnapshot, GameServerError> {
        let output = self.send_command(GET_TIME_COMMAND).await?;
        Ok(parse_game_time(&output.response))
    }

    /// 查詢在線玩家清單
    pub async fn list_players(&self) -> Result<Vec<PlayerRecord>, GameServerError> {
        let output = self.send_command(LIST_PLAYERS_COMMAND).await?;
        let players = parse_players(&output.response);
        info!("目前在線玩家 {} 位", players.len());
        Ok(players)
    }

    /// `host:port` 是否接受 TCP 連線，在探測時限內必定回傳
    pub async fn is_game_port_open(&self, host: &str, port: u16) -> bool {
        self.probe
            .probe(host, port, self.config.timeouts.probe())
            .await
    }

    /// 依 VM 狀態決定是否探測設定中的遊戲埠
    ///
    /// 只有 `Running` 時才探測；其他狀態回傳 `None`（未知），與 `Some(false)` 不同。
    pub async fn game_port_status(&self, state: VmState) -> Option<bool> {
        if state != VmState::Running {
            return None;
        }
        Some(
            self.is_game_port_open(&self.config.host, self.config.port)
                .await,
        )
    }

    /// 查詢 VM 狀態，並在執行中時附上遊戲埠可達性
    pub async fn vm_status(&self, vm: &dyn PowerStateProvider) -> Result<VmStatus, VmError> {
        let vm_state = vm.power_state().await?;
        let game_port_open = self.game_port_status(vm_state).await;
        Ok(VmStatus {
            vm_state,
            game_port_open,
        })
    }
}
