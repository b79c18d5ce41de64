use crate::application_port::{AccessToken, RefreshToken, TokenClaims, TokenCodec, TokenError};
use crate::domain_model::UserId;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id as string
    #[serde(skip_serializing_if = "Option::is_none", default)]
    username: Option<String>,
    iat: i64,
    exp: i64,
    iss: String,
    jti: String, // fresh per token, so re-issuing within one second still rotates
}

fn encode_signed(
    uid: UserId,
    username: Option<String>,
    ttl: Duration,
    secret: &[u8],
    issuer: &str,
) -> Result<(String, DateTime<Utc>), TokenError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + ttl;
    let claims = Claims {
        sub: uid.to_string(),
        username,
        iat: iat_dt.timestamp(),
        exp: exp_dt.timestamp(),
        iss: issuer.to_string(),
        jti: Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))?;
    Ok((token, exp_dt))
}

fn decode_signed(token: &str, secret: &[u8], issuer: &str) -> Result<TokenClaims, TokenError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.leeway = 0;
    v.set_issuer(&[issuer]);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &v).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    })?;

    let user_id = data
        .claims
        .sub
        .parse::<UserId>()
        .map_err(|_| TokenError::Malformed)?;
    let issued_at = Utc
        .timestamp_opt(data.claims.iat, 0)
        .single()
        .ok_or(TokenError::Malformed)?;
    let expires_at = Utc
        .timestamp_opt(data.claims.exp, 0)
        .single()
        .ok_or(TokenError::Malformed)?;

    Ok(TokenClaims {
        user_id,
        username: data.claims.username,
        issued_at,
        expires_at,
    })
}

/// HS256 codec over two independent secrets. Signature and expiry are the
/// whole verification story; no store lookup here.
pub struct JwtCodec {
    cfg: JwtConfig,
}

impl JwtCodec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtCodec { cfg }
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtCodec {
    async fn encode_access(
        &self,
        user: UserId,
        username: &str,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError> {
        let (token, exp_dt) = encode_signed(
            user,
            Some(username.to_string()),
            self.cfg.access_ttl,
            &self.cfg.access_secret,
            &self.cfg.issuer,
        )?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn encode_refresh(
        &self,
        user: UserId,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError> {
        let (token, exp_dt) = encode_signed(
            user,
            None,
            self.cfg.refresh_ttl,
            &self.cfg.refresh_secret,
            &self.cfg.issuer,
        )?;
        Ok((RefreshToken(token), exp_dt))
    }

    async fn decode_access(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode_signed(token, &self.cfg.access_secret, &self.cfg.issuer)
    }

    async fn decode_refresh(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode_signed(token, &self.cfg.refresh_secret, &self.cfg.issuer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> JwtCodec {
        JwtCodec::new(JwtConfig {
            issuer: "vidstream.test".to_string(),
            access_ttl: Duration::from_secs(60),
            refresh_ttl: Duration::from_secs(3600),
            access_secret: b"access-test-secret".to_vec(),
            refresh_secret: b"refresh-test-secret".to_vec(),
        })
    }

    fn some_user() -> UserId {
        UserId(Uuid::new_v4())
    }

    #[tokio::test]
    async fn access_token_round_trips() {
        let codec = test_codec();
        let uid = some_user();

        let (token, exp_dt) = codec.encode_access(uid, "alice").await.unwrap();
        let claims = codec.decode_access(&token.0).await.unwrap();

        assert_eq!(claims.user_id, uid);
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.expires_at.timestamp(), exp_dt.timestamp());
        assert_eq!(
            claims.expires_at.timestamp() - claims.issued_at.timestamp(),
            60
        );
    }

    #[tokio::test]
    async fn refresh_token_round_trips_without_username() {
        let codec = test_codec();
        let uid = some_user();

        let (token, _) = codec.encode_refresh(uid).await.unwrap();
        let claims = codec.decode_refresh(&token.0).await.unwrap();

        assert_eq!(claims.user_id, uid);
        assert_eq!(claims.username, None);
    }

    #[tokio::test]
    async fn zero_ttl_token_is_expired() {
        let codec = JwtCodec::new(JwtConfig {
            access_ttl: Duration::ZERO,
            ..test_codec().cfg
        });

        let (token, _) = codec.encode_access(some_user(), "alice").await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(
            codec.decode_access(&token.0).await.unwrap_err(),
            TokenError::Expired
        );
    }

    #[tokio::test]
    async fn cross_secret_decode_fails_as_invalid_signature() {
        let codec = test_codec();
        let uid = some_user();

        let (refresh, _) = codec.encode_refresh(uid).await.unwrap();
        assert_eq!(
            codec.decode_access(&refresh.0).await.unwrap_err(),
            TokenError::InvalidSignature
        );

        let (access, _) = codec.encode_access(uid, "alice").await.unwrap();
        assert_eq!(
            codec.decode_refresh(&access.0).await.unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[tokio::test]
    async fn garbage_tokens_are_malformed() {
        let codec = test_codec();

        assert_eq!(
            codec.decode_access("").await.unwrap_err(),
            TokenError::Malformed
        );
        assert_eq!(
            codec.decode_access("not.a.jwt").await.unwrap_err(),
            TokenError::Malformed
        );
    }

    #[tokio::test]
    async fn tokens_are_unique_within_one_second() {
        let codec = test_codec();
        let uid = some_user();

        let (first, _) = codec.encode_refresh(uid).await.unwrap();
        let (second, _) = codec.encode_refresh(uid).await.unwrap();

        assert_ne!(first.0, second.0);
    }
}
