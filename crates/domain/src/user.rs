use crate::value_objects::{FullName, PasswordHash, Timestamp, UserEmail, UserId};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: FullName,
    pub email: UserEmail,
    #[serde(skip_serializing)] // 密码字段不暴露给客户端
    pub password: PasswordHash,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// 资料更新，`None` 表示保持原值。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub full_name: Option<FullName>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.bio.is_none() && self.profile_pic.is_none()
    }
}

impl User {
    pub fn register(
        id: UserId,
        full_name: FullName,
        email: UserEmail,
        password: PasswordHash,
        bio: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            full_name,
            email,
            password,
            profile_pic: None,
            bio,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_profile(&mut self, changes: ProfileChanges, now: Timestamp) {
        if let Some(full_name) = changes.full_name {
            self.full_name = full_name;
        }
        if let Some(bio) = changes.bio {
            self.bio = Some(bio);
        }
        if let Some(profile_pic) = changes.profile_pic {
            self.profile_pic = Some(profile_pic);
        }
        self.updated_at = now;
    }
}
