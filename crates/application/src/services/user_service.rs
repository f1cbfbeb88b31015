use std::sync::Arc;

use domain::{DomainError, FullName, ProfileChanges, User, UserEmail, UserId};
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::ApplicationError,
    password::{check_password_policy, PasswordHasher},
    repository::UserRepository,
};

/// 资料更新时姓名的最小长度
const MIN_PROFILE_NAME_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<User, ApplicationError> {
        let full_name = FullName::parse(request.full_name)?;
        let email = UserEmail::parse(request.email)?;
        check_password_policy(&request.password)?;

        if self
            .deps
            .user_repository
            .find_by_email(email.clone())
            .await?
            .is_some()
        {
            return Err(ApplicationError::Domain(DomainError::UserAlreadyExists));
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let bio = request
            .bio
            .map(|bio| bio.trim().to_owned())
            .filter(|bio| !bio.is_empty());

        let user = User::register(
            UserId::from(Uuid::new_v4()),
            full_name,
            email,
            password_hash,
            bio,
            self.deps.clock.now(),
        );

        let stored = self.deps.user_repository.create(user).await?;
        tracing::info!(user_id = %stored.id, "新用户注册");
        Ok(stored)
    }

    /// 邮箱不存在与密码错误返回同一个错误
    pub async fn login(&self, request: LoginRequest) -> Result<User, ApplicationError> {
        let email = UserEmail::parse(request.email).map_err(|_| ApplicationError::Authentication)?;
        let user = self
            .deps
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !password_ok {
            return Err(ApplicationError::Authentication);
        }

        Ok(user)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<User, ApplicationError> {
        self.deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(ApplicationError::Domain(DomainError::UserNotFound))
    }

    pub async fn update_profile(
        &self,
        user_id: UserId,
        request: UpdateProfileRequest,
    ) -> Result<User, ApplicationError> {
        let full_name = match request.full_name {
            Some(name) => {
                let name = FullName::parse(name)?;
                if name.as_str().chars().count() < MIN_PROFILE_NAME_LEN {
                    return Err(ApplicationError::Domain(DomainError::invalid_argument(
                        "full_name",
                        format!("must be at least {MIN_PROFILE_NAME_LEN} characters long"),
                    )));
                }
                Some(name)
            }
            None => None,
        };

        let changes = ProfileChanges {
            full_name,
            bio: request
                .bio
                .map(|bio| bio.trim().to_owned())
                .filter(|bio| !bio.is_empty()),
            profile_pic: request
                .profile_pic
                .map(|pic| pic.trim().to_owned())
                .filter(|pic| !pic.is_empty()),
        };
        if changes.is_empty() {
            return Err(ApplicationError::Domain(DomainError::invalid_argument(
                "profile",
                "no fields to update",
            )));
        }

        let mut user = self.get_user(user_id).await?;
        user.update_profile(changes, self.deps.clock.now());
        let stored = self.deps.user_repository.update(user).await?;
        Ok(stored)
    }
}
