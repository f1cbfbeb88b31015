use std::sync::Arc;

use application::{
    Clock, MessageService, MessageServiceDependencies, PasswordHasher, RealtimeHub, SystemClock,
    UserService, UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::{
    BcryptPasswordHasher, InMemoryMessageRepository, InMemoryUserRepository, WebSocketTransport,
};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub message_service: Arc<MessageService>,
    pub hub: Arc<RealtimeHub>,
    pub transport: Arc<WebSocketTransport>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        message_service: Arc<MessageService>,
        hub: Arc<RealtimeHub>,
        transport: Arc<WebSocketTransport>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_service,
            message_service,
            hub,
            transport,
            jwt_service,
        }
    }

    /// 按配置装配内存存储、bcrypt 与 WebSocket 传输层
    pub fn from_config(config: &AppConfig) -> Self {
        let user_repository = Arc::new(InMemoryUserRepository::new());
        let message_repository = Arc::new(InMemoryMessageRepository::new());
        let password_hasher: Arc<dyn PasswordHasher> =
            Arc::new(BcryptPasswordHasher::from_config(&config.security));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let transport = Arc::new(WebSocketTransport::new());
        let hub = Arc::new(RealtimeHub::new(transport.clone(), &config.realtime));

        let user_service = UserService::new(UserServiceDependencies {
            user_repository: user_repository.clone(),
            password_hasher,
            clock: clock.clone(),
        });
        let message_service = MessageService::new(MessageServiceDependencies {
            user_repository,
            message_repository,
            registry: hub.registry().clone(),
            router: hub.router(),
            clock,
        });

        Self::new(
            Arc::new(user_service),
            Arc::new(message_service),
            hub,
            transport,
            Arc::new(JwtService::new(config.jwt.clone())),
        )
    }
}
