//! Infrastructure layer: configuration, account storage, token revocation
//! storage, and the session/account services that orchestrate them.

pub mod accounts;
pub mod config;
pub mod revocation;
pub mod session;

pub use config::{ConfigError, Settings};
pub use session::{LoginOutcome, SessionError, SessionService};
