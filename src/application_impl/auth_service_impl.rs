use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::debug;

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    session_store: Arc<dyn SessionStore>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        session_store: Arc<dyn SessionStore>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            user_repo,
            session_store,
            credential_hasher,
            token_codec,
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { login, password } = request;

        // Unknown user and wrong password collapse to the same error so the
        // response does not reveal which accounts exist.
        let user = self
            .user_repo
            .find_by_login(&login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_tokens(user.user_id).await?;

        Ok(LoginResult {
            user: user.into(),
            tokens,
        })
    }

    async fn issue_tokens(&self, user_id: UserId) -> Result<AuthTokens, AuthError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        let (access_token, access_exp) = self
            .token_codec
            .encode_access(user.user_id, &user.username)
            .await
            .map_err(|e| AuthError::Encoding(e.to_string()))?;
        let (refresh_token, refresh_exp) = self
            .token_codec
            .encode_refresh(user.user_id)
            .await
            .map_err(|e| AuthError::Encoding(e.to_string()))?;

        // The store write must land before the pair is handed out, otherwise
        // a token could circulate that rotation would reject.
        self.session_store
            .set_current_refresh(user.user_id, &refresh_token.0)
            .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    async fn authenticate(&self, token: &str) -> Result<PublicUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        let claims = self.token_codec.decode_access(token).await.map_err(|e| {
            debug!("access token rejected: {e}");
            AuthError::Unauthenticated
        })?;

        // A signature-valid token for a deleted account is still invalid.
        let user = self
            .user_repo
            .find_by_id(claims.user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        Ok(user.into())
    }

    async fn refresh(&self, presented: &str) -> Result<AuthTokens, AuthError> {
        let claims = self.token_codec.decode_refresh(presented).await.map_err(|e| {
            debug!("refresh token rejected: {e}");
            AuthError::InvalidToken
        })?;

        let stored = match self.session_store.current_refresh(claims.user_id).await {
            Ok(Some(stored)) => stored,
            // Logged out, or the principal itself is gone.
            Ok(None) | Err(AuthError::PrincipalNotFound) => {
                return Err(AuthError::SessionNotFound);
            }
            Err(e) => return Err(e),
        };

        // Byte-for-byte match against the single live value. A mismatch means
        // this token was superseded by a rotation (or stolen and already
        // spent) and the caller must fully re-authenticate.
        if stored != presented {
            return Err(AuthError::TokenReused);
        }

        // Rotation, not renewal: issuing overwrites the stored value, so the
        // presented token is dead from here on.
        self.issue_tokens(claims.user_id).await
    }

    async fn logout(&self, user_id: UserId) -> Result<(), AuthError> {
        self.session_store.clear_current_refresh(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{Argon2PasswordHasher, JwtCodec, JwtConfig};
    use crate::infra_memory::MemoryStore;
    use std::time::Duration;
    use uuid::Uuid;

    fn jwt_config(access_ttl: Duration) -> JwtConfig {
        JwtConfig {
            issuer: "vidstream.test".to_string(),
            access_ttl,
            refresh_ttl: Duration::from_secs(3600),
            access_secret: b"access-test-secret".to_vec(),
            refresh_secret: b"refresh-test-secret".to_vec(),
        }
    }

    fn service_with(access_ttl: Duration) -> (RealAuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = RealAuthService::new(
            store.clone(),
            store.clone(),
            Arc::new(Argon2PasswordHasher),
            Arc::new(JwtCodec::new(jwt_config(access_ttl))),
        );
        (service, store)
    }

    async fn seed_alice(store: &Arc<MemoryStore>) -> UserId {
        let hasher = Argon2PasswordHasher;
        let user_id = UserId(Uuid::new_v4());
        store
            .create(NewUser {
                user_id,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                full_name: "Alice Example".to_string(),
                avatar_url: None,
                cover_image_url: None,
                password_hash: hasher.hash_password("s3cret-pass").await.unwrap(),
            })
            .await
            .unwrap();
        user_id
    }

    #[tokio::test]
    async fn login_then_authenticate_resolves_user() {
        let (service, store) = service_with(Duration::from_secs(60));
        let user_id = seed_alice(&store).await;

        let result = service
            .login(LoginInput {
                login: "alice".to_string(),
                password: "s3cret-pass".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.user.user_id, user_id);

        let principal = service
            .authenticate(&result.tokens.access_token.0)
            .await
            .unwrap();
        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.username, "alice");
    }

    #[tokio::test]
    async fn login_by_email_works() {
        let (service, store) = service_with(Duration::from_secs(60));
        seed_alice(&store).await;

        let result = service
            .login(LoginInput {
                login: "alice@example.com".to_string(),
                password: "s3cret-pass".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_identical() {
        let (service, store) = service_with(Duration::from_secs(60));
        seed_alice(&store).await;

        let wrong = service
            .login(LoginInput {
                login: "alice".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown = service
            .login(LoginInput {
                login: "mallory".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn rotation_chain_invalidates_spent_tokens() {
        let (service, store) = service_with(Duration::from_secs(60));
        let user_id = seed_alice(&store).await;

        let first = service.issue_tokens(user_id).await.unwrap();
        let r1 = first.refresh_token.0;

        let second = service.refresh(&r1).await.unwrap();
        let r2 = second.refresh_token.0.clone();
        assert_ne!(r1, r2);

        // The spent token no longer matches the stored live value.
        assert!(matches!(
            service.refresh(&r1).await.unwrap_err(),
            AuthError::TokenReused
        ));

        // The current token still rotates normally.
        let third = service.refresh(&r2).await.unwrap();
        assert_ne!(third.refresh_token.0, r2);
    }

    #[tokio::test]
    async fn logout_invalidates_outstanding_refresh_token() {
        let (service, store) = service_with(Duration::from_secs(60));
        let user_id = seed_alice(&store).await;

        let tokens = service.issue_tokens(user_id).await.unwrap();
        service.logout(user_id).await.unwrap();

        assert!(matches!(
            service.refresh(&tokens.refresh_token.0).await.unwrap_err(),
            AuthError::SessionNotFound
        ));
    }

    #[tokio::test]
    async fn logout_without_session_is_idempotent() {
        let (service, store) = service_with(Duration::from_secs(60));
        let user_id = seed_alice(&store).await;

        service.logout(user_id).await.unwrap();
        service.logout(user_id).await.unwrap();
    }

    #[tokio::test]
    async fn authenticate_rejects_expired_and_empty_tokens() {
        let (service, store) = service_with(Duration::ZERO);
        let user_id = seed_alice(&store).await;

        let tokens = service.issue_tokens(user_id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(matches!(
            service
                .authenticate(&tokens.access_token.0)
                .await
                .unwrap_err(),
            AuthError::Unauthenticated
        ));
        assert!(matches!(
            service.authenticate("").await.unwrap_err(),
            AuthError::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn authenticate_rejects_token_for_deleted_user() {
        let (service, store) = service_with(Duration::from_secs(60));
        let user_id = seed_alice(&store).await;

        let tokens = service.issue_tokens(user_id).await.unwrap();
        store.remove(user_id);

        assert!(matches!(
            service
                .authenticate(&tokens.access_token.0)
                .await
                .unwrap_err(),
            AuthError::Unauthenticated
        ));
        assert!(matches!(
            service.issue_tokens(user_id).await.unwrap_err(),
            AuthError::PrincipalNotFound
        ));
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let (service, store) = service_with(Duration::from_secs(60));
        let user_id = seed_alice(&store).await;

        let tokens = service.issue_tokens(user_id).await.unwrap();

        // Wrong kind, wrong secret: indistinguishable from a forged token.
        assert!(matches!(
            service.refresh(&tokens.access_token.0).await.unwrap_err(),
            AuthError::InvalidToken
        ));
    }
}
