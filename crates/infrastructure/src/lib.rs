//! 基础设施层实现。
//!
//! 提供内存仓储、bcrypt 密码哈希以及 WebSocket 传输层，实现应用层定义的接口。

pub mod memory;
pub mod password;
pub mod websocket;

pub use memory::{InMemoryMessageRepository, InMemoryUserRepository};
pub use password::BcryptPasswordHasher;
pub use websocket::{OutboundFrame, OutboundReceiver, WebSocketTransport};
