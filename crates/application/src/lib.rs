//! 应用层实现。
//!
//! 用例服务（注册登录、私信收发）围绕领域模型处理输入校验，
//! 实时核心（连接注册表、在线广播、消息路由）负责把变化推送给在线用户。
//! 存储、密码哈希与传输层都以 trait 形式注入。

pub mod clock;
pub mod dto;
pub mod error;
pub mod password;
pub mod realtime;
pub mod repository;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use dto::{MessageDto, SidebarUserDto, UserDto};
pub use error::ApplicationError;
pub use password::{check_password_policy, PasswordHasher, PasswordHasherError};
pub use realtime::{
    ConnectionId, ConnectionLifecycle, ConnectionRegistry, ConnectionState, MessageRouter,
    PresenceBroadcaster, RealtimeEvent, RealtimeHub, RealtimeTransport, Registration,
    RouteOutcome, TransportError,
};
pub use repository::{MessageRepository, UserRepository};
pub use services::{
    LoginRequest, MessageService, MessageServiceDependencies, SendMessageRequest, SignupRequest,
    UpdateProfileRequest, UserService, UserServiceDependencies,
};
