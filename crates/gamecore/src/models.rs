//! 資料模型
//!
//! 主控台查詢結果與 VM 狀態。序列化欄位採 camelCase，與 HTTP 層的 JSON 一致。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 解析失敗時回報的伺服器版本
pub const DEFAULT_SERVER_VERSION: &str = "Alpha 21.1";
/// 解析失敗時回報的遊戲天數
pub const DEFAULT_IN_GAME_DAY: u32 = 14;
/// 解析失敗時回報的遊戲秒數
pub const DEFAULT_IN_GAME_SECONDS: u64 = 52_320;
pub const DEFAULT_TIME_SCALE: u32 = 30;
pub const DEFAULT_DAY_START_HOUR: u32 = 6;
pub const DEFAULT_NIGHT_START_HOUR: u32 = 18;

/// 一遊戲日的秒數
pub const SECONDS_PER_DAY: u64 = 86_400;

/// 遊戲內時間快照
///
/// `in_game_seconds` 以第 1 天 00:00 為 0 起算：
/// `(in_game_day - 1) * 86400 + 當日秒數`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTimeSnapshot {
    pub server_version: String,
    pub observed_at_utc: DateTime<Utc>,
    pub in_game_seconds: u64,
    pub in_game_day: u32,
    pub time_scale: u32,
    pub day_start_hour: u32,
    pub night_start_hour: u32,
}

impl GameTimeSnapshot {
    /// 由天數與當日秒數建立快照，其餘欄位取固定值
    pub fn new(in_game_day: u32, seconds_of_day: u64, observed_at_utc: DateTime<Utc>) -> Self {
        Self {
            server_version: DEFAULT_SERVER_VERSION.to_string(),
            observed_at_utc,
            in_game_seconds: u64::from(in_game_day.saturating_sub(1)) * SECONDS_PER_DAY
                + seconds_of_day,
            in_game_day,
            time_scale: DEFAULT_TIME_SCALE,
            day_start_hour: DEFAULT_DAY_START_HOUR,
            night_start_hour: DEFAULT_NIGHT_START_HOUR,
        }
    }

    /// 解析失敗時使用的預設快照
    pub fn fallback(observed_at_utc: DateTime<Utc>) -> Self {
        Self {
            server_version: DEFAULT_SERVER_VERSION.to_string(),
            observed_at_utc,
            in_game_seconds: DEFAULT_IN_GAME_SECONDS,
            in_game_day: DEFAULT_IN_GAME_DAY,
            time_scale: DEFAULT_TIME_SCALE,
            day_start_hour: DEFAULT_DAY_START_HOUR,
            night_start_hour: DEFAULT_NIGHT_START_HOUR,
        }
    }
}

/// 玩家資料
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub name: String,
    pub is_online: bool,
}

impl PlayerRecord {
    /// 主控台只會列出目前連線中的玩家
    pub fn online(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_online: true,
        }
    }
}

/// VM 電源狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VmState {
    #[default]
    Deallocated,
    Deallocating,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl VmState {
    /// 由雲端平台的電源狀態碼（如 `PowerState/running`）轉換
    ///
    /// 無法辨識的狀態碼一律視為 `Stopped`。
    pub fn from_power_code(code: &str) -> Self {
        let code = code.trim();
        let state = code
            .get(..11)
            .filter(|prefix| prefix.eq_ignore_ascii_case("PowerState/"))
            .map_or(code, |_| &code[11..]);

        match state.to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "starting" => Self::Starting,
            "stopped" => Self::Stopped,
            "stopping" => Self::Stopping,
            "deallocated" => Self::Deallocated,
            "deallocating" => Self::Deallocating,
            _ => Self::Stopped,
        }
    }
}

/// VM 狀態與遊戲埠可達性
///
/// `game_port_open` 只有在 VM 為 `Running` 時才會探測；其他狀態為 `None`（未知）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmStatus {
    pub vm_state: VmState,
    pub game_port_open: Option<bool>,
}
