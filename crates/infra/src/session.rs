//! Login and logout orchestration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use storefront_auth::{verify_password, TokenClaims, TokenError, TokenIssuer};
use storefront_core::Email;

use crate::accounts::{AccountRepository, AccountStoreError};
use crate::revocation::{RevocationClient, RevocationError, RevokeOutcome};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid email or password format")]
    InvalidInput,

    #[error("account does not exist")]
    AccountNotFound,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("invalid password")]
    InvalidPassword,

    #[error(transparent)]
    Store(#[from] AccountStoreError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Revocation(#[from] RevocationError),

    #[error("password verification task failed: {0}")]
    Worker(String),
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub name: String,
    pub claims: TokenClaims,
}

#[derive(Clone)]
pub struct SessionService {
    accounts: Arc<dyn AccountRepository>,
    issuer: Arc<dyn TokenIssuer>,
    revocations: RevocationClient,
}

impl SessionService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        issuer: Arc<dyn TokenIssuer>,
        revocations: RevocationClient,
    ) -> Self {
        Self {
            accounts,
            issuer,
            revocations,
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, SessionError> {
        if password.trim().is_empty() {
            return Err(SessionError::InvalidInput);
        }
        let email = Email::parse(email).map_err(|_| SessionError::InvalidInput)?;

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(SessionError::AccountNotFound)?;

        if !account.is_active {
            tracing::warn!(account_id = %account.id, "login attempt on disabled account");
            return Err(SessionError::AccountDisabled);
        }

        let raw = password.to_string();
        let stored = account.password_hash.as_str().to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&raw, &stored))
            .await
            .map_err(|e| SessionError::Worker(e.to_string()))?;
        if !matches {
            tracing::debug!(account_id = %account.id, "password mismatch");
            return Err(SessionError::InvalidPassword);
        }

        let issued = self.issuer.issue(account.id, account.role, now)?;
        tracing::info!(account_id = %account.id, role = %account.role, "logged in");

        Ok(LoginOutcome {
            token: issued.token,
            name: account.display_name().to_string(),
            claims: issued.claims,
        })
    }

    /// Revoke a token whose signature and time window were already checked.
    ///
    /// Logging out with a token that is already revoked succeeds without a
    /// second write, so concurrent logouts with one token all succeed.
    #[tracing::instrument(skip_all, fields(sub = %claims.sub))]
    pub async fn logout(
        &self,
        token: &str,
        claims: &TokenClaims,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, SessionError> {
        let outcome = self.revoke_once(token, claims, now).await.map_err(|e| {
            tracing::error!(error = %e, "token revocation failed");
            e
        })?;
        tracing::info!(?outcome, "logged out");
        Ok(outcome)
    }

    async fn revoke_once(
        &self,
        token: &str,
        claims: &TokenClaims,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, RevocationError> {
        if self.revocations.is_revoked(token).await? {
            return Ok(RevokeOutcome::AlreadyRevoked);
        }
        self.revocations.revoke(token, claims, now).await
    }
}

impl core::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionService")
            .field("revocations", &self.revocations)
            .finish_non_exhaustive()
    }
}
