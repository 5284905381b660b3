//! Service wiring: account store, revocation store, token codec.
//!
//! In-memory backends by default; `USE_PERSISTENT_STORES=true` switches to
//! Postgres for accounts and (with the `redis` feature) Redis for revocations.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use storefront_auth::Hs256TokenCodec;
use storefront_infra::accounts::{
    AccountRepository, AccountService, AccountStoreError, InMemoryAccountRepository, RegistrationError,
};
use storefront_infra::revocation::{
    InMemoryRevocationStore, RevocationClient, RevocationError, RevocationStore,
};
use storefront_infra::{ConfigError, SessionService, Settings};

use crate::middleware::AuthState;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("account schema setup failed: {0}")]
    Schema(#[from] AccountStoreError),

    #[error(transparent)]
    Revocation(#[from] RevocationError),

    #[error("bootstrap admin: {0}")]
    Bootstrap(#[from] RegistrationError),
}

#[derive(Clone)]
pub struct AppServices {
    pub sessions: SessionService,
    pub accounts: AccountService,
    pub tokens: Arc<Hs256TokenCodec>,
    pub revocations: RevocationClient,
}

impl AppServices {
    pub fn from_parts(
        accounts: Arc<dyn AccountRepository>,
        revocation_store: Arc<dyn RevocationStore>,
        settings: &Settings,
    ) -> Self {
        let tokens = Arc::new(Hs256TokenCodec::new(&settings.jwt_secret, settings.token_ttl));
        let revocations = RevocationClient::new(revocation_store, settings.revocation_timeout);

        Self {
            sessions: SessionService::new(accounts.clone(), tokens.clone(), revocations.clone()),
            accounts: AccountService::new(accounts, settings.bcrypt_cost),
            tokens,
            revocations,
        }
    }

    pub fn in_memory(settings: &Settings) -> Self {
        Self::from_parts(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(InMemoryRevocationStore::new()),
            settings,
        )
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState {
            tokens: self.tokens.clone(),
            revocations: self.revocations.clone(),
        }
    }
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("tokens", &self.tokens)
            .field("revocations", &self.revocations)
            .finish_non_exhaustive()
    }
}

pub async fn build_services(settings: &Settings) -> Result<AppServices, ServicesError> {
    let services = if settings.use_persistent_stores {
        build_persistent_services(settings).await?
    } else {
        tracing::info!("using in-memory account and revocation stores");
        AppServices::in_memory(settings)
    };

    bootstrap_admin(&services, settings).await?;
    Ok(services)
}

async fn build_persistent_services(settings: &Settings) -> Result<AppServices, ServicesError> {
    use storefront_infra::accounts::PostgresAccountRepository;

    let database_url = settings
        .database_url
        .as_deref()
        .ok_or(ConfigError::Missing("DATABASE_URL"))?;

    let pool = sqlx::PgPool::connect(database_url).await?;
    let accounts = PostgresAccountRepository::new(pool);
    accounts.migrate().await?;
    tracing::info!("postgres account store ready");

    let revocation_store = revocation_store(settings)?;
    Ok(AppServices::from_parts(Arc::new(accounts), revocation_store, settings))
}

#[cfg(feature = "redis")]
fn revocation_store(settings: &Settings) -> Result<Arc<dyn RevocationStore>, ServicesError> {
    let store = storefront_infra::revocation::RedisRevocationStore::new(&settings.redis_url)?;
    tracing::info!("redis revocation store configured (connects on first use)");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
fn revocation_store(_settings: &Settings) -> Result<Arc<dyn RevocationStore>, ServicesError> {
    tracing::warn!(
        "USE_PERSISTENT_STORES=true but redis feature not enabled, revocations stay in memory"
    );
    Ok(Arc::new(InMemoryRevocationStore::new()))
}

async fn bootstrap_admin(services: &AppServices, settings: &Settings) -> Result<(), ServicesError> {
    let Some(admin) = &settings.bootstrap_admin else {
        return Ok(());
    };

    let created = services
        .accounts
        .ensure_admin(&admin.email, &admin.password, Utc::now())
        .await?;
    if !created {
        tracing::debug!("bootstrap admin already present");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_infra::config::BootstrapAdmin;

    fn settings() -> Settings {
        let mut settings = Settings::from_lookup(|_| None).unwrap();
        settings.bcrypt_cost = 4;
        settings
    }

    #[tokio::test]
    async fn bootstrap_admin_can_log_in() {
        let mut settings = settings();
        settings.bootstrap_admin = Some(BootstrapAdmin {
            email: "root@shop.test".to_string(),
            password: "Adm1nPass".to_string(),
        });

        let services = build_services(&settings).await.unwrap();
        let outcome = services
            .sessions
            .login("root@shop.test", "Adm1nPass", Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.name, "root");
        assert_eq!(outcome.claims.role, storefront_auth::Role::Admin);

        // Idempotent on restart against the same store.
        assert!(!services
            .accounts
            .ensure_admin("root@shop.test", "Adm1nPass", Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn invalid_bootstrap_email_fails_startup() {
        let mut settings = settings();
        settings.bootstrap_admin = Some(BootstrapAdmin {
            email: "not-an-email".to_string(),
            password: "Adm1nPass".to_string(),
        });

        assert!(matches!(
            build_services(&settings).await,
            Err(ServicesError::Bootstrap(RegistrationError::Invalid(_)))
        ));
    }
}
