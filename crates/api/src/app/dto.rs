//! Request/response bodies.

use serde::{Deserialize, Serialize};

use storefront_auth::Role;
use storefront_core::AccountId;

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Missing fields deserialize as empty strings so the shape check in the
/// session service reports them, instead of a JSON rejection.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub token: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub account_id: AccountId,
    pub role: Role,
    pub name: Option<String>,
}
