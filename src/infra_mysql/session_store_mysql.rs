use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::{MySqlPool, Row};

/// Session state is the `refresh_token` column on the user row itself, so
/// the overwrite is one atomic row update and the database stays the single
/// authority across every process.
pub struct MySqlSessionStore {
    pool: MySqlPool,
}

impl MySqlSessionStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlSessionStore { pool }
    }

    async fn user_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        let row = sqlx::query("SELECT 1 FROM user WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query user: {e}")))?;

        Ok(row.is_some())
    }

    async fn write_refresh(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE user SET refresh_token = ? WHERE user_id = ?")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("write refresh token: {e}")))?;

        // MySQL reports only changed rows, so rows_affected 0 can mean either
        // "no such user" or "value unchanged" (e.g. clearing twice).
        if result.rows_affected() == 0 && !self.user_exists(user_id).await? {
            return Err(AuthError::PrincipalNotFound);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for MySqlSessionStore {
    async fn current_refresh(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        let row = sqlx::query("SELECT refresh_token FROM user WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query refresh token: {e}")))?
            .ok_or(AuthError::PrincipalNotFound)?;

        row.try_get::<Option<String>, _>("refresh_token")
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    async fn set_current_refresh(&self, user_id: UserId, token: &str) -> Result<(), AuthError> {
        self.write_refresh(user_id, Some(token)).await
    }

    async fn clear_current_refresh(&self, user_id: UserId) -> Result<(), AuthError> {
        self.write_refresh(user_id, None).await
    }
}
