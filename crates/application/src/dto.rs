use domain::{Message, Timestamp, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: Uuid::from(user.id),
            full_name: user.full_name.as_str().to_owned(),
            email: user.email.as_str().to_owned(),
            profile_pic: user.profile_pic.clone(),
            bio: user.bio.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// 侧边栏条目：用户资料 + 未读数 + 在线标记
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidebarUserDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub unseen_count: u64,
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub seen: bool,
    pub created_at: Timestamp,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: Uuid::from(message.id),
            sender_id: Uuid::from(message.sender_id),
            receiver_id: Uuid::from(message.receiver_id),
            text: message.text.clone(),
            image_url: message.image_url.clone(),
            seen: message.seen,
            created_at: message.created_at,
        }
    }
}
