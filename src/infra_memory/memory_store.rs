use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory backend implementing both `UserRepo` and `SessionStore` over
/// the same map, mirroring how the MySQL backend keeps the refresh token on
/// the user row. Selected via the `"memory"` database backend; the unit and
/// integration tests run against it.
pub struct MemoryStore {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Drop a user entirely; simulates account deletion.
    pub fn remove(&self, user_id: UserId) {
        if let Ok(mut users) = self.users.lock() {
            users.remove(&user_id);
        }
    }

    fn with_users<T>(
        &self,
        f: impl FnOnce(&mut HashMap<UserId, UserRecord>) -> Result<T, AuthError>,
    ) -> Result<T, AuthError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| AuthError::Store("user map poisoned".to_string()))?;
        f(&mut users)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<(), AuthError> {
        self.with_users(|users| {
            let duplicate = users
                .values()
                .any(|u| u.username == user.username || u.email == user.email);
            if duplicate || users.contains_key(&user.user_id) {
                return Err(AuthError::UserExists);
            }
            users.insert(
                user.user_id,
                UserRecord {
                    user_id: user.user_id,
                    username: user.username,
                    email: user.email,
                    full_name: user.full_name,
                    avatar_url: user.avatar_url,
                    cover_image_url: user.cover_image_url,
                    password_hash: user.password_hash,
                    refresh_token: None,
                    created_at: Utc::now(),
                },
            );
            Ok(())
        })
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        self.with_users(|users| Ok(users.get(&user_id).cloned()))
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, AuthError> {
        self.with_users(|users| {
            Ok(users
                .values()
                .find(|u| u.username == login || u.email == login)
                .cloned())
        })
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        self.with_users(|users| Ok(users.values().any(|u| u.username == username)))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        self.with_users(|users| Ok(users.values().any(|u| u.email == email)))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        username: &str,
        email: &str,
        full_name: &str,
    ) -> Result<(), AuthError> {
        self.with_users(|users| {
            let user = users.get_mut(&user_id).ok_or(AuthError::PrincipalNotFound)?;
            user.username = username.to_string();
            user.email = email.to_string();
            user.full_name = full_name.to_string();
            Ok(())
        })
    }

    async fn set_password_hash(&self, user_id: UserId, hash: &str) -> Result<(), AuthError> {
        self.with_users(|users| {
            let user = users.get_mut(&user_id).ok_or(AuthError::PrincipalNotFound)?;
            user.password_hash = hash.to_string();
            Ok(())
        })
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn current_refresh(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        self.with_users(|users| {
            let user = users.get(&user_id).ok_or(AuthError::PrincipalNotFound)?;
            Ok(user.refresh_token.clone())
        })
    }

    async fn set_current_refresh(&self, user_id: UserId, token: &str) -> Result<(), AuthError> {
        self.with_users(|users| {
            let user = users.get_mut(&user_id).ok_or(AuthError::PrincipalNotFound)?;
            user.refresh_token = Some(token.to_string());
            Ok(())
        })
    }

    async fn clear_current_refresh(&self, user_id: UserId) -> Result<(), AuthError> {
        self.with_users(|users| {
            let user = users.get_mut(&user_id).ok_or(AuthError::PrincipalNotFound)?;
            user.refresh_token = None;
            Ok(())
        })
    }
}
