//! Account storage boundary.
//!
//! The datastore owns accounts. Implementations must be safe to share across
//! request tasks; uniqueness of email and phone number is enforced on insert.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use storefront_auth::{Account, Role};
use storefront_core::{AccountId, Email};

pub mod in_memory;
pub mod postgres;
pub mod service;

pub use in_memory::InMemoryAccountRepository;
pub use postgres::PostgresAccountRepository;
pub use service::{AccountService, RegistrationError};

/// Account attribute that must be unique across accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    PhoneNumber,
}

#[derive(Debug, Error)]
pub enum AccountStoreError {
    #[error("duplicate {0:?}")]
    Duplicate(UniqueField),

    #[error("datastore error: {0}")]
    Backend(String),

    #[error("corrupt account row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountStoreError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError>;

    /// Insert a new account atomically.
    ///
    /// Fails with [`AccountStoreError::Duplicate`] when the email or phone
    /// number is already taken; nothing is written in that case.
    async fn insert(&self, account: &Account) -> Result<(), AccountStoreError>;

    /// All accounts holding `role`, oldest first.
    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, AccountStoreError>;
}

#[async_trait]
impl<R> AccountRepository for Arc<R>
where
    R: AccountRepository + ?Sized,
{
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountStoreError> {
        (**self).find_by_email(email).await
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError> {
        (**self).find_by_id(id).await
    }

    async fn insert(&self, account: &Account) -> Result<(), AccountStoreError> {
        (**self).insert(account).await
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, AccountStoreError> {
        (**self).list_by_role(role).await
    }
}
