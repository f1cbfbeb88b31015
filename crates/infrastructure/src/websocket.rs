//! WebSocket 传输层
//!
//! 每条连接在建立时登记一个无界发送队列，由连接自己的写任务消费。
//! 推送只是入队，不等待网络 I/O；同一连接上的事件按入队顺序写出。

use std::collections::HashMap;

use application::{ConnectionId, RealtimeEvent, RealtimeTransport, TransportError};
use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// 写任务从队列中取出的帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Event(RealtimeEvent),
    /// 服务端主动关闭连接
    Close,
}

pub type OutboundReceiver = mpsc::UnboundedReceiver<OutboundFrame>;

#[derive(Default)]
pub struct WebSocketTransport {
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<OutboundFrame>>>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为新连接创建发送队列，必须在连接登记到注册表之前调用，
    /// 否则会错过上线时的在线状态广播
    pub async fn register_sender(&self, connection: ConnectionId) -> OutboundReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.write().await.insert(connection, tx);
        debug!(connection_id = %connection, "连接发送队列已创建");
        rx
    }

    pub async fn unregister_sender(&self, connection: ConnectionId) -> bool {
        let removed = self.senders.write().await.remove(&connection).is_some();
        if removed {
            debug!(connection_id = %connection, "连接发送队列已移除");
        }
        removed
    }

    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }

    async fn enqueue(
        &self,
        connection: ConnectionId,
        frame: OutboundFrame,
    ) -> Result<(), TransportError> {
        let senders = self.senders.read().await;
        let sender = senders
            .get(&connection)
            .ok_or(TransportError::ConnectionClosed(connection))?;
        // 写任务已退出时接收端被丢弃
        sender
            .send(frame)
            .map_err(|_| TransportError::ConnectionClosed(connection))
    }
}

#[async_trait]
impl RealtimeTransport for WebSocketTransport {
    async fn send(
        &self,
        connection: ConnectionId,
        event: RealtimeEvent,
    ) -> Result<(), TransportError> {
        self.enqueue(connection, OutboundFrame::Event(event)).await
    }

    async fn close(&self, connection: ConnectionId) -> Result<(), TransportError> {
        self.enqueue(connection, OutboundFrame::Close).await
    }
}
