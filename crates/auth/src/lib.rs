//! `storefront-auth`: pure authentication/authorization boundary.
//!
//! This crate has no HTTP or storage dependencies. It knows how
//! to hash and verify credentials, mint and check tokens, and decide whether a
//! role may perform an action. Revocation lives in the infrastructure layer.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod password;
pub mod roles;
pub mod token;

pub use account::{Account, AccountSummary, CustomerRegistration, Gender, ValidatedRegistration};
pub use authorize::{authorize, AuthzError, RolePolicy};
pub use claims::{validate_claims, TokenClaims, TokenValidationError};
pub use password::{check_password_policy, hash_password, verify_password, PasswordError, PasswordHash};
pub use roles::{Role, RoleParseError};
pub use token::{Hs256TokenCodec, IssuedToken, TokenError, TokenIssuer, TokenValidator, DEFAULT_TOKEN_TTL};
