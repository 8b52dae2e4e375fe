//! Registration, login and bearer-token authentication.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use domains::{
    DomainError, IssuedToken, NewUser, PasswordHasher, Result, TokenClaims, TokenService, User, UserRepository,
    ValidationErrors,
};

use crate::input::{Login, Register};

const BAD_CREDENTIALS: &str = "invalid email or password";

/// A user together with a freshly issued token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>, tokens: Arc<dyn TokenService>) -> Self {
        Self { users, hasher, tokens }
    }

    #[instrument(skip_all)]
    pub async fn register(&self, input: Register) -> Result<Session> {
        let registration = input.validate()?;
        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(DomainError::Validation(ValidationErrors::single(
                "email",
                "email has already been taken",
            )));
        }

        let password_hash = self.hasher.hash(&registration.password).await?;
        let user = self
            .users
            .create(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
            })
            .await?;
        let token = self.tokens.issue(user.id).await?;
        info!(user_id = %user.id, "user registered");
        Ok(Session { user, token })
    }

    #[instrument(skip_all)]
    pub async fn login(&self, input: Login) -> Result<Session> {
        let (email, password) = input.validate()?;
        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!("login for unknown email");
            return Err(DomainError::Unauthenticated(BAD_CREDENTIALS.into()));
        };
        if !self.hasher.verify(&password, &user.password_hash).await? {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(DomainError::Unauthenticated(BAD_CREDENTIALS.into()));
        }

        let token = self.tokens.issue(user.id).await?;
        info!(user_id = %user.id, "user logged in");
        Ok(Session { user, token })
    }

    /// Invalidate the token the request was made with.
    #[instrument(skip_all, fields(user_id = %claims.user_id))]
    pub async fn logout(&self, claims: &TokenClaims) -> Result<()> {
        self.tokens.revoke(claims).await?;
        info!("user logged out");
        Ok(())
    }

    /// Resolve a bearer token to its (still existing) user.
    pub async fn authenticate(&self, token: &str) -> Result<(User, TokenClaims)> {
        let claims = self.tokens.verify(token).await?;
        let user = self
            .users
            .find(claims.user_id)
            .await?
            .ok_or_else(|| DomainError::Unauthenticated("token owner no longer exists".into()))?;
        Ok((user, claims))
    }
}
