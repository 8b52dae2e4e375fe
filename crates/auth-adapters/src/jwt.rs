//! # JwtTokenService
//!
//! HS256 bearer tokens. Each token carries a unique `jti`; logout records that
//! id in a revocation set until the token would have expired anyway.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use domains::{DomainError, IssuedToken, Result, TokenClaims, TokenService, UserId};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    jti: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    revoked: DashMap<String, DateTime<Utc>>,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            revoked: DashMap::new(),
        }
    }

    /// Forget revocations of tokens that have expired on their own.
    fn purge_expired(&self) {
        let now = Utc::now();
        self.revoked.retain(|_, expires_at| *expires_at > now);
    }
}

fn invalid() -> DomainError {
    DomainError::Unauthenticated("invalid or expired token".into())
}

#[async_trait]
impl TokenService for JwtTokenService {
    async fn issue(&self, user_id: UserId) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(DomainError::storage)?;
        Ok(IssuedToken { token, expires_at })
    }

    async fn verify(&self, token: &str) -> Result<TokenClaims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            debug!(error = %err, "token rejected");
            invalid()
        })?;
        let claims = data.claims;

        if self.revoked.contains_key(&claims.jti) {
            warn!(jti = %claims.jti, "revoked token presented");
            return Err(DomainError::Unauthenticated("token has been revoked".into()));
        }

        let user_id = claims.sub.parse::<i64>().map(UserId).map_err(|_| invalid())?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or_else(invalid)?;
        Ok(TokenClaims {
            user_id,
            token_id: claims.jti,
            expires_at,
        })
    }

    async fn revoke(&self, claims: &TokenClaims) -> Result<()> {
        self.purge_expired();
        self.revoked.insert(claims.token_id.clone(), claims.expires_at);
        Ok(())
    }
}
