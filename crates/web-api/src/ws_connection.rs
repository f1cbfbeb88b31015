use axum::{
    body::Bytes,
    extract::ws::{Message as WsMessage, WebSocket},
};
use domain::UserId;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use application::{ConnectionId, ConnectionLifecycle};
use infrastructure::OutboundFrame;

use crate::state::AppState;

/// 单条 WebSocket 连接
///
/// 握手时取得的身份在整个连接期间不变。写任务消费传输层的发送队列，
/// 读任务只处理 ping 与关闭；任一任务结束即视为连接关闭。
pub struct WebSocketConnection {
    socket: WebSocket,
    state: AppState,
    lifecycle: ConnectionLifecycle,
}

/// 读任务交给写任务的控制帧
enum WsCommand {
    SendPong(Bytes),
}

impl WebSocketConnection {
    pub fn new(socket: WebSocket, state: AppState, user_id: UserId) -> Self {
        Self {
            socket,
            state,
            lifecycle: ConnectionLifecycle::new(user_id, ConnectionId::new()),
        }
    }

    pub async fn run(mut self) {
        let user_id = self.lifecycle.user_id();
        let connection_id = self.lifecycle.connection_id();
        let transport = self.state.transport.clone();
        let hub = self.state.hub.clone();

        // 先建发送队列再登记，这样上线广播也能送达自己
        let mut outbound = transport.register_sender(connection_id).await;

        if let Err(err) = self.lifecycle.activate(&hub).await {
            tracing::info!(
                user_id = %user_id,
                connection_id = %connection_id,
                error = %err,
                "连接未被接受"
            );
            transport.unregister_sender(connection_id).await;
            let _ = self.socket.send(WsMessage::Close(None)).await;
            return;
        }
        tracing::info!(user_id = %user_id, connection_id = %connection_id, "WebSocket 连接已建立");

        let (mut sender, mut incoming) = self.socket.split();
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

        // 发送任务：统一处理所有对 WebSocket sender 的写操作
        let mut send_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(cmd) = cmd_rx.recv() => {
                        match cmd {
                            WsCommand::SendPong(data) => {
                                if sender.send(WsMessage::Pong(data)).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    frame = outbound.recv() => {
                        match frame {
                            Some(OutboundFrame::Event(event)) => {
                                let payload = match event.to_json() {
                                    Ok(json) => json,
                                    Err(err) => {
                                        tracing::warn!(error = %err, "实时事件序列化失败");
                                        continue;
                                    }
                                };
                                if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                                    tracing::warn!(connection_id = %connection_id, "实时事件写出失败");
                                    break;
                                }
                            }
                            Some(OutboundFrame::Close) | None => {
                                let _ = sender.send(WsMessage::Close(None)).await;
                                break;
                            }
                        }
                    }
                }
            }
            tracing::debug!(connection_id = %connection_id, "WebSocket 发送任务结束");
        });

        // 接收任务：处理来自客户端的控制帧
        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(message)) = incoming.next().await {
                if handle_incoming(message, &cmd_tx).await.is_err() {
                    break;
                }
            }
            tracing::debug!(connection_id = %connection_id, "WebSocket 接收任务结束");
        });

        // 任意一侧结束（关闭帧、错误、EOF、服务端驱逐）都算关闭信号
        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }

        match self.lifecycle.close(&hub).await {
            Ok(broadcast) => tracing::info!(
                user_id = %user_id,
                connection_id = %connection_id,
                presence_changed = broadcast,
                "WebSocket 连接已断开"
            ),
            Err(err) => tracing::warn!(
                connection_id = %connection_id,
                error = %err,
                "连接状态异常"
            ),
        }
        transport.unregister_sender(connection_id).await;
    }
}

async fn handle_incoming(message: WsMessage, cmd_tx: &mpsc::Sender<WsCommand>) -> Result<(), ()> {
    match message {
        WsMessage::Close(_) => Err(()),
        WsMessage::Ping(data) => cmd_tx
            .send(WsCommand::SendPong(data))
            .await
            .map_err(|_| ()),
        // 客户端不通过该通道发送业务数据
        WsMessage::Pong(_) | WsMessage::Text(_) | WsMessage::Binary(_) => Ok(()),
    }
}
