use std::sync::Arc;

use domain::{DomainError, Message, MessageId, UserId};
use uuid::Uuid;

use crate::{
    clock::Clock,
    dto::{SidebarUserDto, UserDto},
    error::ApplicationError,
    realtime::{ConnectionRegistry, MessageRouter, RouteOutcome},
    repository::{MessageRepository, UserRepository},
};

#[derive(Debug, Clone, Default)]
pub struct SendMessageRequest {
    pub text: Option<String>,
    pub image_url: Option<String>,
}

pub struct MessageServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    /// 仅用于读取在线状态
    pub registry: Arc<ConnectionRegistry>,
    pub router: Arc<MessageRouter>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    /// 侧边栏：其他所有用户，附带未读数与在线状态
    pub async fn sidebar_users(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SidebarUserDto>, ApplicationError> {
        let users = self.deps.user_repository.list_except(user_id).await?;
        let unseen = self
            .deps
            .message_repository
            .count_unseen_by_sender(user_id)
            .await?;
        let online = self.deps.registry.snapshot().await;

        Ok(users
            .iter()
            .map(|user| SidebarUserDto {
                user: UserDto::from(user),
                unseen_count: unseen.get(&user.id).copied().unwrap_or(0),
                online: online.contains(user.id),
            })
            .collect())
    }

    /// 读取会话并把对方发来的未读消息标记为已读
    pub async fn conversation(
        &self,
        user_id: UserId,
        peer_id: UserId,
    ) -> Result<Vec<Message>, ApplicationError> {
        let mut messages = self
            .deps
            .message_repository
            .list_conversation(user_id, peer_id)
            .await?;

        let marked = self
            .deps
            .message_repository
            .mark_conversation_seen(peer_id, user_id)
            .await?;
        if marked > 0 {
            for message in messages
                .iter_mut()
                .filter(|message| message.sender_id == peer_id)
            {
                message.mark_seen();
            }
        }

        Ok(messages)
    }

    pub async fn mark_seen(
        &self,
        user_id: UserId,
        message_id: MessageId,
    ) -> Result<Message, ApplicationError> {
        let message = self.find_message(message_id).await?;
        if message.receiver_id != user_id {
            return Err(ApplicationError::Authorization);
        }
        if message.seen {
            return Ok(message);
        }

        self.deps
            .message_repository
            .mark_seen(message_id)
            .await?
            .ok_or(ApplicationError::Domain(DomainError::MessageNotFound))
    }

    /// 持久化之后再推送；推送失败不影响发送结果
    pub async fn send(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        request: SendMessageRequest,
    ) -> Result<Message, ApplicationError> {
        if self
            .deps
            .user_repository
            .find_by_id(receiver_id)
            .await?
            .is_none()
        {
            return Err(ApplicationError::Domain(DomainError::UserNotFound));
        }

        let message = Message::new(
            MessageId::from(Uuid::new_v4()),
            sender_id,
            receiver_id,
            request.text,
            request.image_url,
            self.deps.clock.now(),
        )?;
        let stored = self.deps.message_repository.create(message).await?;

        let outcome = self.deps.router.route_created(&stored.snapshot()).await;
        log_outcome("message-created", stored.id, outcome);
        Ok(stored)
    }

    pub async fn delete(
        &self,
        user_id: UserId,
        message_id: MessageId,
    ) -> Result<Message, ApplicationError> {
        let message = self.find_message(message_id).await?;
        if message.sender_id != user_id {
            return Err(ApplicationError::Authorization);
        }

        let removed = self
            .deps
            .message_repository
            .delete(message_id)
            .await?
            .ok_or(ApplicationError::Domain(DomainError::MessageNotFound))?;

        let outcome = self
            .deps
            .router
            .route_deleted(removed.id, removed.receiver_id)
            .await;
        log_outcome("message-deleted", removed.id, outcome);
        Ok(removed)
    }

    async fn find_message(&self, message_id: MessageId) -> Result<Message, ApplicationError> {
        self.deps
            .message_repository
            .find_by_id(message_id)
            .await?
            .ok_or(ApplicationError::Domain(DomainError::MessageNotFound))
    }
}

fn log_outcome(event: &str, message_id: MessageId, outcome: RouteOutcome) {
    tracing::debug!(
        event,
        message_id = %message_id,
        outcome = ?outcome,
        "实时推送结果"
    );
}
