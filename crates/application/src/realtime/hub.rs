use std::sync::Arc;

use config::RealtimeConfig;
use domain::{MessageId, MessageSnapshot, UserId};

use super::presence::PresenceBroadcaster;
use super::registry::{ConnectionRegistry, Registration};
use super::router::{MessageRouter, RouteOutcome};
use super::transport::{ConnectionId, RealtimeTransport};

/// 实时核心的对外入口
///
/// 组合注册表、在线广播器与消息路由器，向传输层暴露连接打开/关闭钩子，
/// 向请求处理层暴露消息路由。
pub struct RealtimeHub {
    registry: Arc<ConnectionRegistry>,
    presence: PresenceBroadcaster,
    router: Arc<MessageRouter>,
    transport: Arc<dyn RealtimeTransport>,
    evict_superseded: bool,
}

impl RealtimeHub {
    pub fn new(transport: Arc<dyn RealtimeTransport>, config: &RealtimeConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(config.duplicate_policy));
        let router = Arc::new(MessageRouter::new(registry.clone(), transport.clone()));
        Self {
            registry,
            presence: PresenceBroadcaster::new(transport.clone()),
            router,
            transport,
            evict_superseded: config.evict_superseded,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn router(&self) -> Arc<MessageRouter> {
        self.router.clone()
    }

    /// 连接完成握手
    pub async fn on_connection_open(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
    ) -> Registration {
        let registration = self.registry.register(user_id, connection_id).await;

        match registration {
            Registration::Rejected { existing } => {
                tracing::info!(
                    user_id = %user_id,
                    connection_id = %connection_id,
                    existing = %existing,
                    "用户已有活动连接，拒绝新连接"
                );
                return registration;
            }
            Registration::Refreshed => return registration,
            Registration::Inserted | Registration::Replaced { .. } => {}
        }

        tracing::info!(
            user_id = %user_id,
            connection_id = %connection_id,
            "用户上线"
        );
        self.presence.publish(&self.registry).await;

        if let Some(superseded) = registration.superseded() {
            tracing::info!(
                user_id = %user_id,
                superseded = %superseded,
                "旧连接已被新连接取代"
            );
            if self.evict_superseded {
                if let Err(err) = self.transport.close(superseded).await {
                    tracing::warn!(
                        connection_id = %superseded,
                        error = %err,
                        "关闭被取代连接失败"
                    );
                }
            }
        }

        registration
    }

    /// 传输层报告连接关闭；返回是否触发了在线广播
    pub async fn on_connection_close(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        if !self.registry.unregister(user_id, connection_id).await {
            tracing::debug!(
                user_id = %user_id,
                connection_id = %connection_id,
                "忽略已被取代连接的关闭事件"
            );
            return false;
        }

        tracing::info!(
            user_id = %user_id,
            connection_id = %connection_id,
            "用户下线"
        );
        self.presence.publish(&self.registry).await;
        true
    }

    pub async fn route_created(&self, message: &MessageSnapshot) -> RouteOutcome {
        self.router.route_created(message).await
    }

    pub async fn route_deleted(&self, message_id: MessageId, recipient_id: UserId) -> RouteOutcome {
        self.router.route_deleted(message_id, recipient_id).await
    }

    pub async fn online_users(&self) -> Vec<UserId> {
        self.registry.snapshot_identities().await
    }

    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.registry.is_online(user_id).await
    }
}
