//! `storefront-core`: shared primitives for the storefront admin API.
//!
//! This crate contains **pure** building blocks (no infrastructure concerns).

pub mod email;
pub mod error;
pub mod id;

pub use email::Email;
pub use error::DomainError;
pub use id::AccountId;
