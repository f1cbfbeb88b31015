use std::collections::HashMap;

use async_trait::async_trait;
use domain::{Message, MessageId, RepositoryError, User, UserEmail, UserId};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn update(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: UserEmail) -> Result<Option<User>, RepositoryError>;

    // 侧边栏用户列表：除自己以外的所有用户
    async fn list_except(&self, id: UserId) -> Result<Vec<User>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    // 保存消息，返回持久化后的记录
    async fn create(&self, message: Message) -> Result<Message, RepositoryError>;

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    // 删除消息，返回被删除的记录
    async fn delete(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    // 两个用户之间的会话，按创建时间升序
    async fn list_conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<Vec<Message>, RepositoryError>;

    async fn mark_seen(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    // 将 sender -> receiver 方向上所有未读消息标记为已读，返回受影响条数
    async fn mark_conversation_seen(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Result<u64, RepositoryError>;

    // receiver 的未读消息数，按发送者分组
    async fn count_unseen_by_sender(
        &self,
        receiver_id: UserId,
    ) -> Result<HashMap<UserId, u64>, RepositoryError>;
}
