use super::AuthError;
use crate::domain_model::{PublicUser, UserId};

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateAccountInput {
    pub username: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordInput {
    pub old_password: String,
    pub new_password: String,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    async fn register(&self, request: RegisterInput) -> Result<PublicUser, AuthError>;
    async fn change_password(
        &self,
        user_id: UserId,
        request: ChangePasswordInput,
    ) -> Result<(), AuthError>;
    async fn update_account(
        &self,
        user_id: UserId,
        request: UpdateAccountInput,
    ) -> Result<PublicUser, AuthError>;
}
