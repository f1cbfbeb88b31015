//! 在线连接注册表
//!
//! 用户 -> 唯一活动连接 的映射，是"谁在线"的唯一事实来源。
//! 所有读写都经过同一把读写锁，锁内只做内存操作。

use std::collections::HashMap;

use config::DuplicatePolicy;
use domain::UserId;
use tokio::sync::RwLock;

use super::transport::ConnectionId;

/// 在线条目：用户及其当前可寻址的连接
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresenceEntry {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
}

/// 注册表某一时刻的一致视图
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    entries: Vec<PresenceEntry>,
}

impl PresenceSnapshot {
    pub fn identities(&self) -> Vec<UserId> {
        self.entries.iter().map(|entry| entry.user_id).collect()
    }

    pub fn connections(&self) -> Vec<ConnectionId> {
        self.entries.iter().map(|entry| entry.connection_id).collect()
    }

    pub fn entries(&self) -> &[PresenceEntry] {
        &self.entries
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.entries.iter().any(|entry| entry.user_id == user_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `register` 的决策结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// 用户此前不在线
    Inserted,
    /// 同一连接重复注册，映射不变
    Refreshed,
    /// 覆盖了旧连接，旧连接的生命周期仍归传输层管理
    Replaced { superseded: ConnectionId },
    /// 策略为拒绝重复连接，已有连接保持不变
    Rejected { existing: ConnectionId },
}

impl Registration {
    /// 映射是否发生了变化
    pub fn changed(&self) -> bool {
        matches!(self, Registration::Inserted | Registration::Replaced { .. })
    }

    pub fn superseded(&self) -> Option<ConnectionId> {
        match self {
            Registration::Replaced { superseded } => Some(*superseded),
            _ => None,
        }
    }
}

pub struct ConnectionRegistry {
    entries: RwLock<HashMap<UserId, ConnectionId>>,
    policy: DuplicatePolicy,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}

impl ConnectionRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub async fn register(&self, user_id: UserId, connection_id: ConnectionId) -> Registration {
        let mut entries = self.entries.write().await;
        match entries.get(&user_id).copied() {
            None => {
                entries.insert(user_id, connection_id);
                Registration::Inserted
            }
            Some(existing) if existing == connection_id => Registration::Refreshed,
            Some(existing) => match self.policy {
                DuplicatePolicy::Overwrite => {
                    entries.insert(user_id, connection_id);
                    Registration::Replaced {
                        superseded: existing,
                    }
                }
                DuplicatePolicy::Reject => Registration::Rejected { existing },
            },
        }
    }

    /// 仅当当前登记的连接就是 `connection_id` 时才移除，
    /// 防止被取代连接的迟到关闭事件删掉新连接的条目。
    pub async fn unregister(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(&user_id) {
            Some(current) if *current == connection_id => {
                entries.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    pub async fn lookup(&self, user_id: UserId) -> Option<ConnectionId> {
        self.entries.read().await.get(&user_id).copied()
    }

    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.entries.read().await.contains_key(&user_id)
    }

    pub async fn snapshot(&self) -> PresenceSnapshot {
        let entries = self.entries.read().await;
        PresenceSnapshot {
            entries: entries
                .iter()
                .map(|(user_id, connection_id)| PresenceEntry {
                    user_id: *user_id,
                    connection_id: *connection_id,
                })
                .collect(),
        }
    }

    pub async fn snapshot_identities(&self) -> Vec<UserId> {
        self.entries.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
