use std::sync::Arc;

use domain::UserId;
use tokio::sync::Mutex;

use super::events::RealtimeEvent;
use super::registry::ConnectionRegistry;
use super::transport::{ConnectionId, RealtimeTransport};

/// 一次扇出的投递结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: usize,
    pub failed: usize,
}

/// 在线状态广播器
///
/// 每次注册表变更后向所有在线连接推送完整的在线用户列表。
pub struct PresenceBroadcaster {
    transport: Arc<dyn RealtimeTransport>,
    // 串行化扇出：快照在持锁时获取，保证每条连接看到的在线集合只会越来越新
    fanout: Mutex<()>,
}

impl PresenceBroadcaster {
    pub fn new(transport: Arc<dyn RealtimeTransport>) -> Self {
        Self {
            transport,
            fanout: Mutex::new(()),
        }
    }

    /// 从注册表取最新快照并广播
    pub async fn publish(&self, registry: &ConnectionRegistry) -> FanoutReport {
        let _guard = self.fanout.lock().await;
        let snapshot = registry.snapshot().await;
        self.broadcast_online_set(&snapshot.identities(), &snapshot.connections())
            .await
    }

    /// 向每条连接发送同一个 `presence-update` 事件，单条连接失败不影响其余连接
    pub async fn broadcast_online_set(
        &self,
        identities: &[UserId],
        connections: &[ConnectionId],
    ) -> FanoutReport {
        let event = RealtimeEvent::PresenceUpdate(identities.to_vec());
        let mut report = FanoutReport::default();

        for &connection_id in connections {
            match self.transport.send(connection_id, event.clone()).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %err,
                        "在线状态推送失败"
                    );
                }
            }
        }

        tracing::debug!(
            online = identities.len(),
            delivered = report.delivered,
            failed = report.failed,
            "在线状态广播完成"
        );
        report
    }
}
