use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use storefront_auth::{Account, Role};
use storefront_core::{AccountId, Email};

use super::{AccountRepository, AccountStoreError, UniqueField};

/// In-memory account store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    inner: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AccountStoreError {
        AccountStoreError::Backend("account map lock poisoned".to_string())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountStoreError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(map.values().find(|a| &a.email == email).cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn insert(&self, account: &Account) -> Result<(), AccountStoreError> {
        let mut map = self.inner.write().map_err(|_| Self::poisoned())?;

        if map.values().any(|a| a.email == account.email) {
            return Err(AccountStoreError::Duplicate(UniqueField::Email));
        }
        if let Some(phone) = &account.phone_number {
            if map.values().any(|a| a.phone_number.as_ref() == Some(phone)) {
                return Err(AccountStoreError::Duplicate(UniqueField::PhoneNumber));
            }
        }

        map.insert(account.id, account.clone());
        Ok(())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, AccountStoreError> {
        let map = self.inner.read().map_err(|_| Self::poisoned())?;
        let mut accounts: Vec<Account> = map.values().filter(|a| a.role == role).cloned().collect();
        accounts.sort_by_key(|a| (a.created_at, *a.id.as_uuid()));
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storefront_auth::PasswordHash;

    fn account(email: &str, role: Role, phone: Option<&str>) -> Account {
        let mut a = Account::new(
            Email::parse(email).unwrap(),
            role,
            PasswordHash::from_stored("$2b$04$placeholder"),
            Utc::now(),
        );
        a.phone_number = phone.map(str::to_string);
        a
    }

    #[tokio::test]
    async fn insert_and_find() {
        let repo = InMemoryAccountRepository::new();
        let a = account("a@b.com", Role::Customer, Some("0123456789"));
        repo.insert(&a).await.unwrap();

        let found = repo.find_by_email(&a.email).await.unwrap().unwrap();
        assert_eq!(found.id, a.id);
        assert_eq!(repo.find_by_id(a.id).await.unwrap().unwrap().email, a.email);
        assert!(repo.find_by_id(AccountId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_duplicates() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(&account("a@b.com", Role::Customer, Some("0123456789"))).await.unwrap();

        let err = repo
            .insert(&account("a@b.com", Role::Customer, Some("0999999999")))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountStoreError::Duplicate(UniqueField::Email)));

        let err = repo
            .insert(&account("c@d.com", Role::Customer, Some("0123456789")))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountStoreError::Duplicate(UniqueField::PhoneNumber)));
    }

    #[tokio::test]
    async fn lists_by_role() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(&account("a@b.com", Role::Customer, None)).await.unwrap();
        repo.insert(&account("s@b.com", Role::Staff, None)).await.unwrap();
        repo.insert(&account("c@b.com", Role::Customer, None)).await.unwrap();

        let customers = repo.list_by_role(Role::Customer).await.unwrap();
        assert_eq!(customers.len(), 2);
        assert!(customers.iter().all(|a| a.role == Role::Customer));
    }
}
