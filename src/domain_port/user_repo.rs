use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Full user row, refresh token included. Stays inside the persistence and
/// service layers; handlers only ever see `PublicUser`.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for PublicUser {
    fn from(record: UserRecord) -> Self {
        PublicUser {
            user_id: record.user_id,
            username: record.username,
            email: record.email,
            full_name: record.full_name,
            avatar_url: record.avatar_url,
            cover_image_url: record.cover_image_url,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a row. Fails `UserExists` on a duplicate username or email.
    async fn create(&self, user: NewUser) -> Result<(), AuthError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError>;

    /// Lookup by username or email (login accepts either).
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    /// Fails `PrincipalNotFound` if the row no longer exists.
    async fn update_profile(
        &self,
        user_id: UserId,
        username: &str,
        email: &str,
        full_name: &str,
    ) -> Result<(), AuthError>;

    /// Fails `PrincipalNotFound` if the row no longer exists.
    async fn set_password_hash(&self, user_id: UserId, hash: &str) -> Result<(), AuthError>;
}
