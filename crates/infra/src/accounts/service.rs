//! Account use-cases: customer self-registration, listing, bootstrap admin.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use storefront_auth::{hash_password, Account, AccountSummary, CustomerRegistration, PasswordError, PasswordHash, Role};
use storefront_core::{AccountId, DomainError, Email};

use super::{AccountRepository, AccountStoreError, UniqueField};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("duplicate {0:?}")]
    Duplicate(UniqueField),

    #[error(transparent)]
    Hash(#[from] PasswordError),

    #[error(transparent)]
    Store(AccountStoreError),

    #[error("password hashing task failed: {0}")]
    Worker(String),
}

impl From<AccountStoreError> for RegistrationError {
    fn from(value: AccountStoreError) -> Self {
        match value {
            AccountStoreError::Duplicate(field) => RegistrationError::Duplicate(field),
            other => RegistrationError::Store(other),
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepository>, bcrypt_cost: u32) -> Self {
        Self { accounts, bcrypt_cost }
    }

    #[tracing::instrument(skip_all)]
    pub async fn register_customer(
        &self,
        input: CustomerRegistration,
        now: DateTime<Utc>,
    ) -> Result<AccountSummary, RegistrationError> {
        let registration = input.validate()?;
        let hash = self.hash(registration.password.clone()).await?;

        let account = Account::new_customer(registration, hash, now);
        self.accounts.insert(&account).await?;

        tracing::info!(account_id = %account.id, "customer registered");
        Ok(account.summary())
    }

    pub async fn list_customers(&self) -> Result<Vec<AccountSummary>, AccountStoreError> {
        let accounts = self.accounts.list_by_role(Role::Customer).await?;
        Ok(accounts.iter().map(Account::summary).collect())
    }

    pub async fn find(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError> {
        self.accounts.find_by_id(id).await
    }

    /// Create an administrator unless an account with that email exists.
    ///
    /// Returns `true` when a new account was created.
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RegistrationError> {
        let email = Email::parse(email)?;
        if self.accounts.find_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        let hash = self.hash(password.to_string()).await?;
        let account = Account::new(email, Role::Admin, hash, now);
        match self.accounts.insert(&account).await {
            Ok(()) => {
                tracing::info!(account_id = %account.id, "bootstrap admin created");
                Ok(true)
            }
            // Another instance created it first.
            Err(AccountStoreError::Duplicate(UniqueField::Email)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn hash(&self, password: String) -> Result<PasswordHash, RegistrationError> {
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| RegistrationError::Worker(e.to_string()))??;
        Ok(hash)
    }
}
