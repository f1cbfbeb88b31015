//! 进程内存储实现
//!
//! 数据只存在于当前进程，重启即丢失。

use std::collections::HashMap;

use application::{MessageRepository, UserRepository};
use async_trait::async_trait;
use domain::{Message, MessageId, RepositoryError, User, UserEmail, UserId};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        // 邮箱唯一约束
        if users.contains_key(&user.id) || users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        let Some(stored) = users.get_mut(&user.id) else {
            return Err(RepositoryError::NotFound);
        };
        *stored = user.clone();
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn list_except(&self, id: UserId) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        let mut others: Vec<User> = users
            .values()
            .filter(|user| user.id != id)
            .cloned()
            .collect();
        others.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(others)
    }
}

/// 消息按插入顺序保存
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut messages = self.messages.write().await;
        if messages.iter().any(|stored| stored.id == message.id) {
            return Err(RepositoryError::Conflict);
        }
        messages.push(message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|message| message.id == id).cloned())
    }

    async fn delete(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let mut messages = self.messages.write().await;
        let position = messages.iter().position(|message| message.id == id);
        Ok(position.map(|index| messages.remove(index)))
    }

    async fn list_conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut conversation: Vec<Message> = messages
            .iter()
            .filter(|message| message.is_between(user_a, user_b))
            .cloned()
            .collect();
        // 稳定排序，同一时刻的消息保持插入顺序
        conversation.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(conversation)
    }

    async fn mark_seen(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let mut messages = self.messages.write().await;
        Ok(messages
            .iter_mut()
            .find(|message| message.id == id)
            .map(|message| {
                message.mark_seen();
                message.clone()
            }))
    }

    async fn mark_conversation_seen(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Result<u64, RepositoryError> {
        let mut messages = self.messages.write().await;
        let mut updated = 0;
        for message in messages.iter_mut().filter(|message| {
            message.sender_id == sender_id && message.receiver_id == receiver_id && !message.seen
        }) {
            message.mark_seen();
            updated += 1;
        }
        Ok(updated)
    }

    async fn count_unseen_by_sender(
        &self,
        receiver_id: UserId,
    ) -> Result<HashMap<UserId, u64>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut counts = HashMap::new();
        for message in messages
            .iter()
            .filter(|message| message.receiver_id == receiver_id && !message.seen)
        {
            *counts.entry(message.sender_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
