use domain::{MessageId, MessageSnapshot, UserId};
use serde::{Deserialize, Serialize};

/// 删除事件载荷，接收方据此清理本地视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedMessage {
    pub id: MessageId,
    pub recipient_id: UserId,
}

/// 服务端推送给客户端的实时事件。
///
/// 线上格式为 `{"event": "<name>", "payload": ...}`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum RealtimeEvent {
    /// 当前在线用户全集，顺序无意义
    PresenceUpdate(Vec<UserId>),
    MessageCreated(MessageSnapshot),
    MessageDeleted(DeletedMessage),
}

impl RealtimeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::PresenceUpdate(_) => "presence-update",
            RealtimeEvent::MessageCreated(_) => "message-created",
            RealtimeEvent::MessageDeleted(_) => "message-deleted",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
