//! Telnet 主控台模組
//!
//! 實作驅動遊戲管理主控台所需的最小 Telnet 客戶端行為

mod protocol;
mod session;

pub use protocol::{strip_iac, Negotiation, IAC};
pub use session::{CommandOutput, ConsoleError, SessionOptions, SessionState, TelnetSession};
