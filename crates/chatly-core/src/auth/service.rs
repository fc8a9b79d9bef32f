//! Authentication service.
//!
//! Orchestrates validation, the user repository, password hashing, token
//! issuance and the logout blacklist. Generic over its ports so the API layer
//! picks concrete adapters and tests use in-memory ones.

use chrono::Utc;
use uuid::Uuid;

use chatly_types::error::{AuthError, RepositoryError};
use chatly_types::identity::{
    AuthSession, AuthenticatedIdentity, LoginRequest, RegisterRequest, UserRecord,
};

use crate::repository::blacklist::TokenBlacklist;
use crate::repository::user::UserRepository;

use super::validation::{validate_login, validate_register};
use super::{PasswordHasher, TokenIssuer};

pub struct AuthService<U, H, T, B> {
    users: U,
    hasher: H,
    tokens: T,
    blacklist: B,
}

impl<U, H, T, B> AuthService<U, H, T, B>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenIssuer,
    B: TokenBlacklist,
{
    pub fn new(users: U, hasher: H, tokens: T, blacklist: B) -> Self {
        Self {
            users,
            hasher,
            tokens,
            blacklist,
        }
    }

    pub fn token_validity(&self) -> chrono::Duration {
        self.tokens.validity()
    }

    pub fn blacklist(&self) -> &B {
        &self.blacklist
    }

    /// Create an account and sign the new user in.
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthSession, AuthError> {
        let req = validate_register(req)?;

        let existing = self
            .users
            .find_by_login(Some(&req.username), Some(&req.email))
            .await?;
        if existing.is_some() {
            return Err(AuthError::Duplicate);
        }

        let record = UserRecord {
            id: Uuid::now_v7(),
            username: req.username,
            email: req.email,
            password_hash: self.hasher.hash(&req.password)?,
            created_at: Utc::now(),
        };

        // A concurrent registration can still win the unique constraint
        let record = self.users.create(&record).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::Duplicate,
            other => AuthError::Storage(other),
        })?;

        tracing::info!(user_id = %record.id, username = %record.username, "user registered");
        self.start_session(record.identity())
    }

    /// Check credentials and issue a token.
    ///
    /// An unknown account and a wrong password produce the same error.
    pub async fn login(&self, req: &LoginRequest) -> Result<AuthSession, AuthError> {
        let req = validate_login(req)?;

        let Some(record) = self
            .users
            .find_by_login(req.username.as_deref(), req.email.as_deref())
            .await?
        else {
            tracing::debug!("login for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(&req.password, &record.password_hash) {
            tracing::debug!(user_id = %record.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %record.id, "user logged in");
        self.start_session(record.identity())
    }

    /// Revoke `token` for the rest of its lifetime.
    ///
    /// Succeeds without a token. A token that no longer verifies is still
    /// blacklisted, for one full validity period.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AuthError> {
        let Some(token) = token else {
            return Ok(());
        };

        let expires_at = self
            .tokens
            .verify(token)
            .ok()
            .and_then(|claims| claims.expires_at())
            .unwrap_or_else(|| Utc::now() + self.tokens.validity());

        self.blacklist.revoke(token, expires_at).await?;
        tracing::info!("session token revoked");
        Ok(())
    }

    /// Resolve a token to the identity it was issued for.
    pub async fn authenticate(
        &self,
        token: Option<&str>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.verify(token)?;
        if self.blacklist.is_revoked(token).await? {
            return Err(AuthError::Revoked);
        }
        Ok(claims.identity())
    }

    fn start_session(&self, identity: AuthenticatedIdentity) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(&identity)?;
        Ok(AuthSession { identity, token })
    }
}
