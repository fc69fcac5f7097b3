//! TCP 埠可達性探測
//!
//! 只做 TCP 連線，不交換任何資料。所有失敗（拒絕連線、逾時、DNS 失敗）
//! 一律回報為 `false`，不會往上拋錯。

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// 埠可達性探測
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// `host:port` 是否能在 `limit` 內完成 TCP 連線
    async fn probe(&self, host: &str, port: u16, limit: Duration) -> bool;
}

/// 以實際 TCP 連線探測
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPortProbe;

#[async_trait]
impl ReachabilityProbe for TcpPortProbe {
    async fn probe(&self, host: &str, port: u16, limit: Duration) -> bool {
        probe(host, port, limit).await
    }
}

/// 嘗試連線到 `host:port`，在 `limit` 內成功即回傳 `true`
///
/// 逾時會取消進行中的連線並釋放 socket；成功建立的連線立即關閉。
pub async fn probe(host: &str, port: u16, limit: Duration) -> bool {
    let addr = format!("{}:{}", host, port);
    match timeout(limit, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => {
            drop(stream);
            debug!("{} 可連線", addr);
            true
        }
        Ok(Err(e)) => {
            debug!("{} 無法連線: {}", addr, e);
            false
        }
        Err(_) => {
            debug!("{} 連線逾時 ({:?})", addr, limit);
            false
        }
    }
}
