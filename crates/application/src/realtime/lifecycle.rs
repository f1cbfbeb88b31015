//! 单条连接的状态机：`Connecting -> Active -> Closed`
//!
//! 每条物理连接对应一个新实例，没有重连状态。

use std::fmt;

use domain::UserId;
use thiserror::Error;

use super::hub::RealtimeHub;
use super::registry::Registration;
use super::transport::ConnectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 传输层已接受连接并取得握手身份
    Connecting,
    /// 已登记到注册表
    Active,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Active => "active",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
    #[error("user {user_id} already has an active connection")]
    Rejected { user_id: UserId },
}

#[derive(Debug)]
pub struct ConnectionLifecycle {
    user_id: UserId,
    connection_id: ConnectionId,
    state: ConnectionState,
}

impl ConnectionLifecycle {
    pub fn new(user_id: UserId, connection_id: ConnectionId) -> Self {
        Self {
            user_id,
            connection_id,
            state: ConnectionState::Connecting,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// `Connecting -> Active`：登记连接并广播在线集合。
    ///
    /// 重复连接被策略拒绝时直接进入 `Closed`，注册表保持不变。
    pub async fn activate(&mut self, hub: &RealtimeHub) -> Result<Registration, LifecycleError> {
        self.ensure_state(ConnectionState::Connecting, ConnectionState::Active)?;

        let registration = hub
            .on_connection_open(self.user_id, self.connection_id)
            .await;
        if let Registration::Rejected { .. } = registration {
            self.state = ConnectionState::Closed;
            return Err(LifecycleError::Rejected {
                user_id: self.user_id,
            });
        }

        self.state = ConnectionState::Active;
        Ok(registration)
    }

    /// 响应传输层的任意关闭信号，返回是否触发了在线广播。
    pub async fn close(&mut self, hub: &RealtimeHub) -> Result<bool, LifecycleError> {
        match self.state {
            ConnectionState::Connecting => {
                // 握手未完成，注册表里没有这条连接
                self.state = ConnectionState::Closed;
                Ok(false)
            }
            ConnectionState::Active => {
                self.state = ConnectionState::Closed;
                Ok(hub
                    .on_connection_close(self.user_id, self.connection_id)
                    .await)
            }
            ConnectionState::Closed => Err(LifecycleError::InvalidTransition {
                from: ConnectionState::Closed,
                to: ConnectionState::Closed,
            }),
        }
    }

    fn ensure_state(&self, from: ConnectionState, to: ConnectionState) -> Result<(), LifecycleError> {
        if self.state != from {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        Ok(())
    }
}
