//! Telnet 主控台 Session
//!
//! 一個 Session 只負責一次命令往返：
//! 連線 → 等待歡迎訊息 → 驗證 → 送出命令 → 收集回應 → 關閉。
//!
//! 主控台的命令輸出沒有長度也沒有結束標記，因此以「靜默超過
//! [`SessionOptions::inactivity_timeout`]」視為回應結束。這是對目標主控台的
//! 活性假設而非協定保證，慢速連線上可能提早截斷回應。
//!
//! 持續輸出日誌的主控台可能永遠不會靜默，所以收集回應另有總時限
//! [`SessionOptions::response_deadline`]，歡迎訊息則整體受
//! [`SessionOptions::banner_timeout`] 限制。

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

use super::protocol::strip_iac;
use crate::encoding::{decode_console_line, encode_console_line};

/// 歡迎訊息結束的提示（主控台標準的 help/exit 說明行）
const BANNER_END_MARKERS: [&str; 2] = ["Press 'help'", "Press 'exit'"];

/// 密碼提示關鍵字（不分大小寫）
const PASSWORD_PROMPT: &str = "password";

/// 驗證成功回應關鍵字（不分大小寫）
const AUTH_SUCCESS: &str = "logon successful";

const EXIT_COMMAND: &str = "exit";

/// 主控台 Session 錯誤
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("連線失敗: {0}")]
    Connect(#[source] io::Error),

    #[error("DNS 解析失敗: {0}")]
    DnsResolutionFailed(String),

    #[error("{0:?} 階段逾時")]
    Timeout(SessionState),

    #[error("{0:?} 階段連線已被對方關閉")]
    ConnectionClosed(SessionState),

    #[error("傳輸錯誤: {0}")]
    Io(#[from] io::Error),

    #[error("Session 已結束，不可重複使用")]
    SessionFinished,

    #[error("Session 狀態錯誤: 預期 {expected:?}，目前為 {actual:?}")]
    OutOfOrder {
        expected: SessionState,
        actual: SessionState,
    },
}

/// Session 狀態
///
/// `Closed` 與 `Failed` 為終止狀態，進入後 Session 不可再使用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    AwaitingBanner,
    Authenticating,
    Ready,
    Sending,
    Draining,
    Closed,
    Failed,
}

impl SessionState {
    /// 是否為終止狀態
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// Session 參數
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 主控台管理密碼
    pub admin_password: String,
    /// 歡迎訊息、驗證回應與寫入的逾時
    pub banner_timeout: Duration,
    /// 命令回應的靜默判定時間
    pub inactivity_timeout: Duration,
    /// 收集命令回應的總時限，到期時以已收到的內容為完整回應
    pub response_deadline: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            admin_password: String::new(),
            banner_timeout: Duration::from_secs(10),
            inactivity_timeout: Duration::from_millis(200),
            response_deadline: Duration::from_secs(10),
        }
    }
}

/// 一次命令往返的結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// 命令送出前收到的歡迎訊息（呼叫端通常直接丟棄）
    pub header: String,
    /// 命令送出後收集到的原始回應
    pub response: String,
}

/// 單次讀取結果
enum LineRead {
    Line(String),
    Silence,
    Eof,
}

/// Telnet 主控台 Session
///
/// 對傳輸層只要求 `AsyncRead + AsyncWrite`，實際使用時為 [`TcpStream`]。
/// 每個步驟皆可單獨呼叫；[`TelnetSession::run`] 依序執行完整流程。
pub struct TelnetSession<S> {
    stream: BufReader<S>,
    options: SessionOptions,
    state: SessionState,
    header: String,
    /// 尚未湊成完整一行的位元組（逾時中斷的讀取會留在這裡）
    pending: Vec<u8>,
}

impl TelnetSession<TcpStream> {
    /// 連線到主控台
    ///
    /// DNS 解析與 TCP 連線共用 `connect_timeout`。
    pub async fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        options: SessionOptions,
    ) -> Result<Self, ConsoleError> {
        info!("正在連線到主控台 {}:{}", host, port);

        let addr = format!("{}:{}", host, port);
        let attempt = async {
            let socket_addrs: Vec<SocketAddr> = tokio::net::lookup_host(&addr)
                .await
                .map_err(|e| ConsoleError::DnsResolutionFailed(e.to_string()))?
                .collect();

            if socket_addrs.is_empty() {
                return Err(ConsoleError::DnsResolutionFailed(format!(
                    "無法解析主機: {}",
                    host
                )));
            }
            debug!("已解析到位址: {:?}", socket_addrs);

            connect_any(&socket_addrs).await
        };

        let stream = match timeout(connect_timeout, attempt).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!("無法連線到主控台 {}:{}: {}", host, port, e);
                return Err(e);
            }
            Err(_) => {
                error!("連線到主控台 {}:{} 逾時 ({:?})", host, port, connect_timeout);
                return Err(ConsoleError::Timeout(SessionState::Connecting));
            }
        };

        stream.set_nodelay(true)?;

        info!("已連線到主控台 {}:{}", host, port);
        Ok(Self::new(stream, options))
    }
}

/// 依序嘗試每個位址，全部失敗時回報最後一個錯誤
async fn connect_any(addrs: &[SocketAddr]) -> Result<TcpStream, ConsoleError> {
    let mut last_error = None;
    for target in addrs {
        match TcpStream::connect(target).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("連線到 {} 失敗: {}", target, e);
                last_error = Some(e);
            }
        }
    }
    Err(ConsoleError::Connect(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "沒有可用的位址")
    })))
}

impl<S> TelnetSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// 以已建立的連線建立 Session，初始狀態為 `AwaitingBanner`
    pub fn new(stream: S, options: SessionOptions) -> Self {
        Self {
            stream: BufReader::new(stream),
            options,
            state: SessionState::AwaitingBanner,
            header: String::new(),
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 目前累積的歡迎訊息
    pub fn header(&self) -> &str {
        &self.header
    }

    /// 執行完整的命令往返，結束後 Session 即被消耗
    pub async fn run(mut self, command: &str) -> Result<CommandOutput, ConsoleError> {
        if self.await_banner().await? == SessionState::Authenticating {
            self.authenticate().await?;
        }
        self.send(command).await?;
        let response = self.drain().await?;
        self.close().await?;

        Ok(CommandOutput {
            header: std::mem::take(&mut self.header),
            response,
        })
    }

    /// 讀取第一行並判斷是否需要驗證
    ///
    /// 收到密碼提示時轉為 `Authenticating`；否則視為已驗證，
    /// 把該行當作歡迎訊息並繼續讀到結束提示，轉為 `Ready`。
    pub async fn await_banner(&mut self) -> Result<SessionState, ConsoleError> {
        self.expect_state(SessionState::AwaitingBanner)?;
        let result = self.await_banner_inner().await;
        self.settle(result)
    }

    async fn await_banner_inner(&mut self) -> Result<SessionState, ConsoleError> {
        let first = self.read_banner_line().await?;

        if first.to_lowercase().contains(PASSWORD_PROMPT) {
            debug!("收到密碼提示");
            self.state = SessionState::Authenticating;
            return Ok(self.state);
        }

        debug!("主控台未要求密碼，直接讀取歡迎訊息");
        let finished = is_banner_end(&first);
        self.push_header(&first);
        if finished {
            self.finish_banner().await?;
        } else {
            self.drain_banner().await?;
        }
        Ok(self.state)
    }

    /// 送出管理密碼並讀完歡迎訊息
    ///
    /// 驗證回應只用於紀錄：部分主控台版本沒有明確的失敗訊息，
    /// 因此看似失敗的回應不會中止 Session。
    pub async fn authenticate(&mut self) -> Result<SessionState, ConsoleError> {
        self.expect_state(SessionState::Authenticating)?;
        let result = self.authenticate_inner().await;
        self.settle(result)
    }

    async fn authenticate_inner(&mut self) -> Result<SessionState, ConsoleError> {
        let password = self.options.admin_password.clone();
        self.write_line(&password).await?;

        let reply = self.read_banner_line().await?;
        if reply.to_lowercase().contains(AUTH_SUCCESS) {
            debug!("主控台驗證成功");
        } else {
            warn!("主控台驗證可能失敗: {}", reply);
        }

        self.drain_banner().await?;
        Ok(self.state)
    }

    /// 送出命令，成功後轉為 `Draining`
    pub async fn send(&mut self, command: &str) -> Result<(), ConsoleError> {
        self.expect_state(SessionState::Ready)?;
        self.state = SessionState::Sending;

        info!("執行主控台命令: {}", command);
        let result = self.write_line(command).await;
        self.settle(result)?;

        self.state = SessionState::Draining;
        Ok(())
    }

    /// 收集命令回應，直到主控台靜默、關閉連線或超過 `response_deadline`
    ///
    /// 靜默時尚未湊成一行的位元組也會一併算進回應。
    pub async fn drain(&mut self) -> Result<String, ConsoleError> {
        self.expect_state(SessionState::Draining)?;
        let result = self.drain_inner().await;
        self.settle(result)
    }

    async fn drain_inner(&mut self) -> Result<String, ConsoleError> {
        let limit = self.options.inactivity_timeout;
        let deadline = Instant::now() + self.options.response_deadline;
        let mut response = String::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                if !self.pending.is_empty() {
                    let partial = self.take_pending();
                    response.push_str(&partial);
                    response.push_str("\r\n");
                }
                warn!(
                    "收集回應超過 {:?} 仍未靜默，以已收到的內容結束",
                    self.options.response_deadline
                );
                break;
            }

            match self.read_line_within(limit.min(remaining)).await? {
                LineRead::Line(line) => {
                    response.push_str(&line);
                    response.push_str("\r\n");
                }
                LineRead::Silence => {
                    if !self.pending.is_empty() {
                        let partial = self.take_pending();
                        response.push_str(&partial);
                        response.push_str("\r\n");
                    }
                    debug!("主控台靜默超過 {:?}，視為回應結束", limit);
                    break;
                }
                LineRead::Eof => {
                    debug!("主控台關閉連線，回應結束");
                    break;
                }
            }
        }

        Ok(response)
    }

    /// 送出 exit 並關閉連線（皆為盡力而為，錯誤忽略）
    pub async fn close(&mut self) -> Result<(), ConsoleError> {
        if self.state.is_terminal() {
            return Err(ConsoleError::SessionFinished);
        }

        info!("關閉主控台連線");
        let _ = self.write_line(EXIT_COMMAND).await;
        let limit = self.options.banner_timeout;
        let _ = timeout(limit, self.stream.get_mut().shutdown()).await;

        self.state = SessionState::Closed;
        Ok(())
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), ConsoleError> {
        if self.state == expected {
            Ok(())
        } else if self.state.is_terminal() {
            Err(ConsoleError::SessionFinished)
        } else {
            Err(ConsoleError::OutOfOrder {
                expected,
                actual: self.state,
            })
        }
    }

    /// 傳輸錯誤一律讓 Session 進入 `Failed`
    fn settle<T>(&mut self, result: Result<T, ConsoleError>) -> Result<T, ConsoleError> {
        result.map_err(|e| {
            error!("主控台 Session 失敗 ({:?}): {}", self.state, e);
            self.state = SessionState::Failed;
            e
        })
    }

    /// 讀到歡迎訊息結束提示為止，再多讀一行後轉為 `Ready`
    ///
    /// 整段歡迎訊息共用 `banner_timeout`，一直沒有結束提示時以 `Timeout` 失敗。
    async fn drain_banner(&mut self) -> Result<(), ConsoleError> {
        let deadline = Instant::now() + self.options.banner_timeout;
        loop {
            let line = self.read_banner_line_until(deadline).await?;
            let finished = is_banner_end(&line);
            self.push_header(&line);
            if finished {
                return self.finish_banner().await;
            }
        }
    }

    /// 結束提示之後通常跟著一個空行；沒有的話也不視為錯誤
    async fn finish_banner(&mut self) -> Result<(), ConsoleError> {
        let limit = self.options.banner_timeout;
        match self.read_line_within(limit).await? {
            LineRead::Line(line) => self.push_header(&line),
            LineRead::Silence => debug!("結束提示後沒有額外內容"),
            LineRead::Eof => return Err(ConsoleError::ConnectionClosed(self.state)),
        }
        self.state = SessionState::Ready;
        Ok(())
    }

    async fn read_banner_line(&mut self) -> Result<String, ConsoleError> {
        let deadline = Instant::now() + self.options.banner_timeout;
        self.read_banner_line_until(deadline).await
    }

    async fn read_banner_line_until(&mut self, deadline: Instant) -> Result<String, ConsoleError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ConsoleError::Timeout(self.state));
        }
        match self.read_line_within(remaining).await? {
            LineRead::Line(line) => Ok(line),
            LineRead::Silence => Err(ConsoleError::Timeout(self.state)),
            LineRead::Eof => Err(ConsoleError::ConnectionClosed(self.state)),
        }
    }

    async fn read_line_within(&mut self, limit: Duration) -> io::Result<LineRead> {
        // read_until 被逾時中斷時，已讀到的位元組會保留在 pending
        match timeout(limit, self.stream.read_until(b'\n', &mut self.pending)).await {
            Err(_) => Ok(LineRead::Silence),
            Ok(Err(e)) => Err(e),
            Ok(Ok(0)) if self.pending.is_empty() => Ok(LineRead::Eof),
            Ok(Ok(_)) => Ok(LineRead::Line(self.take_pending())),
        }
    }

    fn take_pending(&mut self) -> String {
        let raw = std::mem::take(&mut self.pending);
        let (data, negotiations) = strip_iac(&raw);
        if !negotiations.is_empty() {
            debug!("忽略 Telnet 協商: {:?}", negotiations);
        }
        decode_console_line(&data)
    }

    async fn write_line(&mut self, text: &str) -> Result<(), ConsoleError> {
        let state = self.state;
        let limit = self.options.banner_timeout;
        let data = encode_console_line(text);
        let stream = self.stream.get_mut();

        let write = async {
            stream.write_all(&data).await?;
            stream.flush().await
        };

        match timeout(limit, write).await {
            Ok(result) => result.map_err(ConsoleError::from),
            Err(_) => Err(ConsoleError::Timeout(state)),
        }
    }

    fn push_header(&mut self, line: &str) {
        self.header.push_str(line);
        self.header.push_str("\r\n");
    }
}

fn is_banner_end(line: &str) -> bool {
    BANNER_END_MARKERS.iter().any(|marker| line.contains(marker))
}
