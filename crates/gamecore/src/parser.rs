//! 主控台回應解析
//!
//! 把一次命令往返收集到的原始文字轉為結構化資料。回應的第一行一律是
//! 主控台的命令回顯（例如 `INF Executing command 'gettime' by Telnet from ...`），
//! 解析前先丟棄。
//!
//! 解析失敗不會回傳錯誤：遊戲時間改用預設快照，玩家清單回傳已解析的部分。
//! 兩者都會以 warn 等級記錄原始回應。

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::models::{GameTimeSnapshot, PlayerRecord};

/// 玩家資料行的標記
const PLAYER_MARKER: &str = "id=";
/// 無玩家在線時的統計行
const NO_PLAYERS_MARKER: &str = "Total of 0";

lazy_static! {
    // Day <天數>, <hh:mm[:ss]>
    static ref DAY_LINE: Regex =
        Regex::new(r"^Day\s+(\d+)\s*,\s*(\d{1,2}):(\d{1,2})(?::(\d{1,2}))?$").unwrap();
}

/// 解析 `gettime` 的回應
///
/// 無法辨識時回傳 [`GameTimeSnapshot::fallback`]，並記錄警告。
pub fn parse_game_time(text: &str) -> GameTimeSnapshot {
    match try_parse_game_time(text) {
        Some(snapshot) => snapshot,
        None => {
            warn!("無法解析遊戲時間回應，改用預設值: {:?}", text);
            GameTimeSnapshot::fallback(Utc::now())
        }
    }
}

/// 解析 `gettime` 的回應，無法辨識時回傳 `None`
///
/// 丟棄回顯後的第一個非空行必須符合 `Day <n>, <hh:mm[:ss]>`，且天數至少為 1。
pub fn try_parse_game_time(text: &str) -> Option<GameTimeSnapshot> {
    let line = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .nth(1)?;

    let captures = DAY_LINE.captures(line)?;
    let day: u32 = captures[1].parse().ok().filter(|day| *day >= 1)?;
    let hours: u64 = captures[2].parse().ok().filter(|h| *h < 24)?;
    let minutes: u64 = captures[3].parse().ok().filter(|m| *m < 60)?;
    let seconds: u64 = match captures.get(4) {
        Some(s) => s.as_str().parse().ok().filter(|s| *s < 60)?,
        None => 0,
    };

    let seconds_of_day = hours * 3600 + minutes * 60 + seconds;
    debug!("遊戲時間: 第 {} 天，當日 {} 秒", day, seconds_of_day);
    Some(GameTimeSnapshot::new(day, seconds_of_day, Utc::now()))
}

/// 解析 `listplayers` 的回應
///
/// 每個含 `id=` 的行取第二個逗號分隔欄位為玩家名稱。遇到無法取出名稱的
/// 玩家行時停止掃描，回傳已解析的部分。
pub fn parse_players(text: &str) -> Vec<PlayerRecord> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let Some((_echo, rest)) = lines.split_first() else {
        return Vec::new();
    };

    let has_player_lines = rest.iter().any(|line| line.contains(PLAYER_MARKER));
    if !has_player_lines && rest.iter().any(|line| line.contains(NO_PLAYERS_MARKER)) {
        debug!("目前沒有玩家在線");
        return Vec::new();
    }

    let mut players = Vec::new();
    for line in rest.iter().filter(|line| line.contains(PLAYER_MARKER)) {
        match player_name(line) {
            Some(name) => players.push(PlayerRecord::online(name)),
            None => {
                warn!(
                    "玩家資料行格式錯誤，僅回傳已解析的 {} 位玩家: {:?}",
                    players.len(),
                    line
                );
                break;
            }
        }
    }

    players
}

/// 取玩家資料行的第二個非空逗號分隔欄位
///
/// 例: `0. id=171, Avarice, pos=(...), ...` → `Avarice`
fn player_name(line: &str) -> Option<&str> {
    line.split(',')
        .filter(|field| !field.is_empty())
        .nth(1)
        .map(str::trim)
        .filter(|name| !name.is_empty())
}
