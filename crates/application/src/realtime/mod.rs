//! 实时投递核心
//!
//! 维护"用户 -> 唯一活动连接"的注册表，在注册表变化时广播在线集合，
//! 并把新建/删除的消息推送到接收方的连接（若在线）。
//! 传输层通过 [`RealtimeTransport`] 注入，测试中可替换为内存实现。

pub mod events;
pub mod hub;
pub mod lifecycle;
pub mod presence;
pub mod registry;
pub mod router;
pub mod transport;

pub use events::{DeletedMessage, RealtimeEvent};
pub use hub::RealtimeHub;
pub use lifecycle::{ConnectionLifecycle, ConnectionState, LifecycleError};
pub use presence::{FanoutReport, PresenceBroadcaster};
pub use registry::{ConnectionRegistry, PresenceEntry, PresenceSnapshot, Registration};
pub use router::{MessageRouter, RouteOutcome};
pub use transport::{ConnectionId, RealtimeTransport, TransportError};
