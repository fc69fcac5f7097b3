//! VM 電源狀態來源
//!
//! 實際的雲端 VM 操作（查詢、開機、關機、重開）由外部元件提供，
//! 這裡只定義主控台客戶端需要的介面。

use async_trait::async_trait;
use thiserror::Error;

use crate::models::VmState;

/// VM 操作錯誤
#[derive(Debug, Error)]
pub enum VmError {
    #[error("VM 操作失敗: {0}")]
    Operation(String),
}

/// VM 電源狀態查詢
#[async_trait]
pub trait PowerStateProvider: Send + Sync {
    async fn power_state(&self) -> Result<VmState, VmError>;
}
