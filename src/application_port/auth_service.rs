use crate::domain_model::{PublicUser, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing, malformed, bad-signature or expired access token. The API
    /// boundary never tells the client which of these it was.
    #[error("authentication required")]
    Unauthenticated,
    /// Presented refresh token failed signature, parse or expiry checks.
    #[error("invalid refresh token")]
    InvalidToken,
    /// No refresh token stored for the subject (logged out, or never logged in).
    #[error("no active session")]
    SessionNotFound,
    /// Presented refresh token no longer matches the stored live value.
    /// Superseded by rotation, or stolen. The caller must re-login.
    #[error("refresh token superseded")]
    TokenReused,
    #[error("user not found")]
    PrincipalNotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user already exists")]
    UserExists,
    #[error("{0}")]
    Validation(String),
    #[error("token encoding failed: {0}")]
    Encoding(String),
    #[error("store error: {0}")]
    Store(String),
}

/// Credential codec failure taxonomy. `Encoding` is the only issuance-side
/// failure and is treated as fatal by callers.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("claims serialization failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub username: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies the two token kinds. Access and refresh tokens use
/// distinct secrets and TTLs and are never interchangeable: decoding one
/// kind with the other kind's secret fails `InvalidSignature`.
///
/// Pure over input and wall-clock time; safe to call concurrently.
#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn encode_access(
        &self,
        user: UserId,
        username: &str,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError>;
    async fn encode_refresh(
        &self,
        user: UserId,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError>;
    async fn decode_access(&self, token: &str) -> Result<TokenClaims, TokenError>;
    async fn decode_refresh(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    /// Username or email, as the client prefers.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: PublicUser,
    pub tokens: AuthTokens,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and mint a fresh token pair for the user.
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Mint a fresh access + refresh pair and persist the refresh token as
    /// the subject's single live session value. The only place refresh
    /// tokens are created; runs at login and at every successful rotation.
    async fn issue_tokens(&self, user_id: UserId) -> Result<AuthTokens, AuthError>;
    /// Request verification gate: validate an access token and resolve the
    /// principal. Stateless; never reads refresh state.
    async fn authenticate(&self, token: &str) -> Result<PublicUser, AuthError>;
    /// Refresh-token rotation: validate the presented token against the
    /// stored live value, then mint and store a replacement pair.
    async fn refresh(&self, presented: &str) -> Result<AuthTokens, AuthError>;
    /// Clear the stored refresh token. Outstanding refresh tokens fail
    /// rotation with `SessionNotFound` from here on.
    async fn logout(&self, user_id: UserId) -> Result<(), AuthError>;
}
