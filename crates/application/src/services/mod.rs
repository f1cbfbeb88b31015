pub mod message_service;
pub mod user_service;

pub use message_service::{MessageService, MessageServiceDependencies, SendMessageRequest};
pub use user_service::{
    LoginRequest, SignupRequest, UpdateProfileRequest, UserService, UserServiceDependencies,
};
