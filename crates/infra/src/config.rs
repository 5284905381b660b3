//! Process configuration, read once at startup.
//!
//! Every value comes from an environment variable with a development default.
//! `Settings::from_lookup` takes any key lookup so tests never touch the real
//! process environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use storefront_auth::{password::DEFAULT_COST, DEFAULT_TOKEN_TTL};

const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
const DEFAULT_REVOCATION_TIMEOUT: Duration = Duration::from_millis(2_000);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// Credentials for an administrator created at startup if absent.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub redis_url: String,
    pub revocation_timeout: Duration,
    pub bcrypt_cost: u32,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl core::fmt::Debug for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("use_persistent_stores", &self.use_persistent_stores)
            .field("redis_url", &self.redis_url)
            .field("revocation_timeout", &self.revocation_timeout)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let token_ttl = match get("TOKEN_TTL_SECS") {
            Some(raw) => {
                let secs: u64 = parse("TOKEN_TTL_SECS", &raw)?;
                if secs == 0 {
                    return Err(invalid("TOKEN_TTL_SECS", raw, "must be greater than zero"));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TOKEN_TTL,
        };

        let use_persistent_stores = match get("USE_PERSISTENT_STORES") {
            Some(raw) => parse_bool("USE_PERSISTENT_STORES", raw)?,
            None => false,
        };

        let database_url = get("DATABASE_URL");
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let redis_url = get("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        let revocation_timeout = match get("REVOCATION_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = parse("REVOCATION_TIMEOUT_MS", &raw)?;
                if ms == 0 {
                    return Err(invalid("REVOCATION_TIMEOUT_MS", raw, "must be greater than zero"));
                }
                Duration::from_millis(ms)
            }
            None => DEFAULT_REVOCATION_TIMEOUT,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => {
                let cost: u32 = parse("BCRYPT_COST", &raw)?;
                if !(4..=31).contains(&cost) {
                    return Err(invalid("BCRYPT_COST", raw, "must be between 4 and 31"));
                }
                cost
            }
            None => DEFAULT_COST,
        };

        let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_EMAIL"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            (Some(_), None) => return Err(invalid("BOOTSTRAP_ADMIN_PASSWORD", String::new(), "required with BOOTSTRAP_ADMIN_EMAIL")),
            (None, Some(_)) => return Err(invalid("BOOTSTRAP_ADMIN_EMAIL", String::new(), "required with BOOTSTRAP_ADMIN_PASSWORD")),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            use_persistent_stores,
            database_url,
            redis_url,
            revocation_timeout,
            bcrypt_cost,
            bootstrap_admin,
        })
    }
}

fn invalid(key: &'static str, value: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.into(),
        reason: reason.into(),
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| invalid(key, raw, e.to_string()))
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match (raw, default) {
        (Some(raw), _) => parse(key, &raw),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(invalid(key, String::new(), "no value and no default")),
    }
}

fn parse_bool(key: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw, "expected a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(s.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(s.token_ttl, Duration::from_secs(86_400));
        assert!(!s.use_persistent_stores);
        assert_eq!(s.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(s.revocation_timeout, Duration::from_secs(2));
        assert_eq!(s.bcrypt_cost, 8);
        assert!(s.bootstrap_admin.is_none());
    }

    #[test]
    fn overrides() {
        let s = settings(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_SECS", "60"),
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/storefront"),
            ("REVOCATION_TIMEOUT_MS", "250"),
            ("BCRYPT_COST", "10"),
            ("BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "Adm1nPass"),
        ])
        .unwrap();
        assert_eq!(s.jwt_secret, "s3cret");
        assert_eq!(s.token_ttl, Duration::from_secs(60));
        assert!(s.use_persistent_stores);
        assert_eq!(s.revocation_timeout, Duration::from_millis(250));
        assert_eq!(s.bcrypt_cost, 10);
        assert_eq!(s.bootstrap_admin.unwrap().email, "root@example.com");
    }

    #[test]
    fn persistent_stores_need_a_database() {
        assert_eq!(
            settings(&[("USE_PERSISTENT_STORES", "1")]),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            settings(&[("TOKEN_TTL_SECS", "soon")]),
            Err(ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. })
        ));
        assert!(matches!(
            settings(&[("TOKEN_TTL_SECS", "0")]),
            Err(ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. })
        ));
        assert!(matches!(
            settings(&[("BCRYPT_COST", "2")]),
            Err(ConfigError::Invalid { key: "BCRYPT_COST", .. })
        ));
    }

    #[test]
    fn debug_hides_secrets() {
        let s = settings(&[
            ("JWT_SECRET", "top-secret-value"),
            ("BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "Adm1nPass"),
        ])
        .unwrap();
        let rendered = format!("{s:?}");
        assert!(!rendered.contains("top-secret-value"));
        assert!(!rendered.contains("Adm1nPass"));
    }
}
