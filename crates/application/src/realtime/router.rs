use std::sync::Arc;

use domain::{MessageId, MessageSnapshot, UserId};

use super::events::{DeletedMessage, RealtimeEvent};
use super::registry::ConnectionRegistry;
use super::transport::{ConnectionId, RealtimeTransport};

/// 单次路由的结果，仅用于日志和测试；调用方无需处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Delivered(ConnectionId),
    /// 接收方不在线，消息已由存储方持久化，下次拉取时可见
    Offline,
    Failed(ConnectionId),
}

/// 消息路由器
///
/// 查找接收方当前的连接并推送一次；至多一次、尽力而为，不重试、不排队、不追踪确认。
/// 发送者是否有权发送或删除由上游请求处理方负责，这里信任输入。
pub struct MessageRouter {
    registry: Arc<ConnectionRegistry>,
    transport: Arc<dyn RealtimeTransport>,
}

impl MessageRouter {
    pub fn new(registry: Arc<ConnectionRegistry>, transport: Arc<dyn RealtimeTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub async fn route_created(&self, message: &MessageSnapshot) -> RouteOutcome {
        self.push(
            message.recipient_id,
            RealtimeEvent::MessageCreated(message.clone()),
        )
        .await
    }

    pub async fn route_deleted(&self, message_id: MessageId, recipient_id: UserId) -> RouteOutcome {
        self.push(
            recipient_id,
            RealtimeEvent::MessageDeleted(DeletedMessage {
                id: message_id,
                recipient_id,
            }),
        )
        .await
    }

    async fn push(&self, recipient_id: UserId, event: RealtimeEvent) -> RouteOutcome {
        // 查找完成即释放读锁，发送在锁外进行
        let Some(connection_id) = self.registry.lookup(recipient_id).await else {
            tracing::debug!(
                recipient_id = %recipient_id,
                event = event.name(),
                "接收方不在线，跳过推送"
            );
            return RouteOutcome::Offline;
        };

        let event_name = event.name();
        match self.transport.send(connection_id, event).await {
            Ok(()) => {
                tracing::debug!(
                    recipient_id = %recipient_id,
                    connection_id = %connection_id,
                    event = event_name,
                    "实时事件已推送"
                );
                RouteOutcome::Delivered(connection_id)
            }
            Err(err) => {
                tracing::warn!(
                    recipient_id = %recipient_id,
                    connection_id = %connection_id,
                    event = event_name,
                    error = %err,
                    "实时事件推送失败"
                );
                RouteOutcome::Failed(connection_id)
            }
        }
    }
}
