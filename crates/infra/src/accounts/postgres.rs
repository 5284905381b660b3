//! Postgres-backed account store.
//!
//! Every statement is parameterized. Inserts run in a transaction: the
//! uniqueness checks and the insert commit together, and the table's unique
//! constraints catch anything that races past the checks.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use storefront_auth::{Account, Gender, PasswordHash, Role};
use storefront_core::{AccountId, Email};

use super::{AccountRepository, AccountStoreError, UniqueField};

const SCHEMA: &str = include_str!("../../../../migrations/0001_accounts.sql");

const SELECT_ACCOUNT: &str = r#"
    SELECT
        id,
        email,
        role,
        password_hash,
        phone_number,
        gender,
        dob,
        is_active,
        created_at
    FROM accounts
"#;

pub struct PostgresAccountRepository {
    pool: Arc<PgPool>,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `accounts` table and its indexes if they do not exist.
    pub async fn migrate(&self) -> Result<(), AccountStoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, AccountStoreError> {
        let row = sqlx::query(&format!("{SELECT_ACCOUNT} WHERE email = $1 LIMIT 1"))
            .bind(email.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(backend)?;

        row.map(|r| account_from_row(&r)).transpose()
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountStoreError> {
        let row = sqlx::query(&format!("{SELECT_ACCOUNT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(backend)?;

        row.map(|r| account_from_row(&r)).transpose()
    }

    #[tracing::instrument(skip_all, fields(account_id = %account.id))]
    async fn insert(&self, account: &Account) -> Result<(), AccountStoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let email_taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE email = $1)")
            .bind(account.email.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;
        if email_taken {
            tx.rollback().await.map_err(backend)?;
            return Err(AccountStoreError::Duplicate(UniqueField::Email));
        }

        if let Some(phone) = &account.phone_number {
            let phone_taken: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE phone_number = $1)")
                    .bind(phone)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(backend)?;
            if phone_taken {
                tx.rollback().await.map_err(backend)?;
                return Err(AccountStoreError::Duplicate(UniqueField::PhoneNumber));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id,
                email,
                role,
                password_hash,
                phone_number,
                gender,
                dob,
                is_active,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.email.as_str())
        .bind(account.role.as_str())
        .bind(account.password_hash.as_str())
        .bind(account.phone_number.as_deref())
        .bind(account.gender.map(|g| g.as_str()))
        .bind(account.dob)
        .bind(account.is_active)
        .bind(account.created_at)
        .execute(&mut *tx)
        .await
        .map_err(insert_error)?;

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, AccountStoreError> {
        let rows = sqlx::query(&format!("{SELECT_ACCOUNT} WHERE role = $1 ORDER BY created_at, id"))
            .bind(role.as_str())
            .fetch_all(&*self.pool)
            .await
            .map_err(backend)?;

        rows.iter().map(account_from_row).collect()
    }
}

fn backend(e: sqlx::Error) -> AccountStoreError {
    AccountStoreError::Backend(e.to_string())
}

/// Map unique-constraint violations that raced past the checks.
fn insert_error(e: sqlx::Error) -> AccountStoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some("accounts_phone_number_key") => AccountStoreError::Duplicate(UniqueField::PhoneNumber),
                _ => AccountStoreError::Duplicate(UniqueField::Email),
            };
        }
    }
    backend(e)
}

fn account_from_row(row: &PgRow) -> Result<Account, AccountStoreError> {
    let corrupt = |e: sqlx::Error| AccountStoreError::Corrupt(e.to_string());

    let id: uuid::Uuid = row.try_get("id").map_err(corrupt)?;
    let email: String = row.try_get("email").map_err(corrupt)?;
    let role: String = row.try_get("role").map_err(corrupt)?;
    let password_hash: String = row.try_get("password_hash").map_err(corrupt)?;
    let phone_number: Option<String> = row.try_get("phone_number").map_err(corrupt)?;
    let gender: Option<String> = row.try_get("gender").map_err(corrupt)?;
    let dob: Option<NaiveDate> = row.try_get("dob").map_err(corrupt)?;
    let is_active: bool = row.try_get("is_active").map_err(corrupt)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(corrupt)?;

    Ok(Account {
        id: AccountId::from_uuid(id),
        email: Email::parse(&email).map_err(|e| AccountStoreError::Corrupt(e.to_string()))?,
        role: role
            .parse()
            .map_err(|e: storefront_auth::RoleParseError| AccountStoreError::Corrupt(e.to_string()))?,
        password_hash: PasswordHash::from_stored(password_hash),
        phone_number,
        gender: gender
            .map(|g| g.parse::<Gender>())
            .transpose()
            .map_err(|e| AccountStoreError::Corrupt(e.to_string()))?,
        dob,
        is_active,
        created_at,
    })
}
