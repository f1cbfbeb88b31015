use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{MessageId, Timestamp, UserId};

/// 一对一私信。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub seen: bool,
    pub created_at: Timestamp,
}

impl Message {
    /// 创建新消息，文本会去掉首尾空白；文本和图片至少要有一个。
    pub fn new(
        id: MessageId,
        sender_id: UserId,
        receiver_id: UserId,
        text: Option<String>,
        image_url: Option<String>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let text = text
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let image_url = image_url
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        if text.is_none() && image_url.is_none() {
            return Err(DomainError::invalid_argument(
                "message",
                "must contain text or an image",
            ));
        }

        Ok(Self {
            id,
            sender_id,
            receiver_id,
            text,
            image_url,
            seen: false,
            created_at,
        })
    }

    pub fn mark_seen(&mut self) {
        self.seen = true;
    }

    /// 是否属于 a 与 b 之间的会话（不区分方向）
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    pub fn snapshot(&self) -> MessageSnapshot {
        MessageSnapshot::from(self)
    }
}

/// 推送给在线接收方的只读消息快照。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSnapshot {
    pub id: MessageId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    pub created_at: Timestamp,
}

impl From<&Message> for MessageSnapshot {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            recipient_id: message.receiver_id,
            text: message.text.clone(),
            image_url: message.image_url.clone(),
            created_at: message.created_at,
        }
    }
}
