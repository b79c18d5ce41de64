use crate::application_port::*;
use crate::domain_model::*;

/// At most one live refresh token per user: the value on the user's own
/// record. The backing store must make the overwrite atomic per user (a
/// single row update) so concurrent rotations serialize there; the loser
/// then observes a mismatched value and fails `TokenReused` upstream.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` means "user exists, no active session". A missing user is
    /// `PrincipalNotFound`, never silently conflated with no session.
    async fn current_refresh(&self, user_id: UserId) -> Result<Option<String>, AuthError>;

    /// Unconditional overwrite; last writer wins.
    async fn set_current_refresh(&self, user_id: UserId, token: &str) -> Result<(), AuthError>;

    /// Logout. Idempotent when no session is stored.
    async fn clear_current_refresh(&self, user_id: UserId) -> Result<(), AuthError>;
}
