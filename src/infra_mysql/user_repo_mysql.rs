use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

const USER_COLUMNS: &str = "user_id, username, email, full_name, avatar_url, \
                            cover_image_url, password_hash, refresh_token, created_at";

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<UserRecord, AuthError> {
        let user_id: UserId = row
            .try_get("user_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let full_name: String = row
            .try_get("full_name")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let avatar_url: Option<String> = row
            .try_get("avatar_url")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let cover_image_url: Option<String> = row
            .try_get("cover_image_url")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let refresh_token: Option<String> = row
            .try_get("refresh_token")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(UserRecord {
            user_id,
            username,
            email,
            full_name,
            avatar_url,
            cover_image_url,
            password_hash,
            refresh_token,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create(&self, user: NewUser) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO user (user_id, username, email, full_name, avatar_url, cover_image_url, password_hash)
VALUES (?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar_url)
        .bind(&user.cover_image_url)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        let row_opt: Option<MySqlRow> =
            sqlx::query(&format!("SELECT {USER_COLUMNS} FROM user WHERE user_id = ?"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AuthError::Store(format!("query user by id: {e}")))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE username = ? OR email = ?"
        ))
        .bind(login)
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(format!("query user by login: {e}")))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let row = sqlx::query("SELECT 1 FROM user WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query username: {e}")))?;

        Ok(row.is_some())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let row = sqlx::query("SELECT 1 FROM user WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query email: {e}")))?;

        Ok(row.is_some())
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        username: &str,
        email: &str,
        full_name: &str,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
UPDATE user SET username = ?, email = ?, full_name = ?
WHERE user_id = ?
"#,
        )
        .bind(username)
        .bind(email)
        .bind(full_name)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        // MySQL reports only changed rows, so an unchanged profile also
        // yields rows_affected 0; check existence instead.
        if self.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::PrincipalNotFound);
        }
        Ok(())
    }

    async fn set_password_hash(&self, user_id: UserId, hash: &str) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE user SET password_hash = ? WHERE user_id = ?")
            .bind(hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        // MySQL reports only changed rows, so fall back to an existence check
        // before deciding the user is gone.
        if result.rows_affected() == 0 && self.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::PrincipalNotFound);
        }
        Ok(())
    }
}
