use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::events::RealtimeEvent;

/// 单条物理连接的不透明句柄，由传输层在接受连接时生成。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),
    #[error("send failed: {0}")]
    SendFailed(String),
}

impl TransportError {
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed(message.into())
    }
}

/// 传输层必须提供的推送原语。
///
/// 实现只负责把事件交给对应连接（例如写入该连接的发送队列），
/// 不应在调用中等待远端网络 I/O；同一连接上的事件必须按调用顺序送达。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn send(&self, connection: ConnectionId, event: RealtimeEvent)
        -> Result<(), TransportError>;

    /// 请求关闭连接；关闭完成后传输层照常上报关闭事件
    async fn close(&self, connection: ConnectionId) -> Result<(), TransportError>;
}
