//! Error responses.
//!
//! Every failure renders as `{ "success": false, "message": ... }`; server
//! errors add an `error` field with the diagnostic.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use storefront_auth::TokenValidationError;
use storefront_core::DomainError;
use storefront_infra::accounts::{AccountStoreError, RegistrationError, UniqueField};
use storefront_infra::revocation::RevocationError;
use storefront_infra::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No auth token, authorization denied!")]
    MissingToken,

    #[error("Token has expired, authorization denied!")]
    TokenExpired,

    #[error("Token authorization failed, authorization denied!")]
    TokenInvalid,

    #[error("Token has been revoked, authorization denied!")]
    TokenRevoked,

    #[error("Not authorized for this action, authorization denied!")]
    RoleDenied,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Server { message: String, error: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn server(message: impl Into<String>, error: impl ToString) -> Self {
        Self::Server {
            message: message.into(),
            error: error.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken | ApiError::RoleDenied | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::TokenExpired | ApiError::TokenInvalid | ApiError::TokenRevoked => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Server { message, error } => {
                tracing::error!(error = %error, "{message}");
                json!({ "success": false, "message": message, "error": error })
            }
            other => json!({ "success": false, "message": other.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<TokenValidationError> for ApiError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => ApiError::TokenExpired,
            _ => ApiError::TokenInvalid,
        }
    }
}

/// Malformed JSON, a missing content type and mistyped fields all answer 400
/// in the usual envelope.
impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        tracing::debug!(status = %value.status(), reason = %value.body_text(), "request body rejected");
        ApiError::bad_request("Invalid request body")
    }
}

impl From<RevocationError> for ApiError {
    fn from(value: RevocationError) -> Self {
        ApiError::server("Server error, cannot verify token!", value)
    }
}

impl From<AccountStoreError> for ApiError {
    fn from(value: AccountStoreError) -> Self {
        ApiError::server("Server error!", value)
    }
}

impl From<SessionError> for ApiError {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::InvalidInput => ApiError::bad_request("Invalid email or password format"),
            SessionError::AccountNotFound => ApiError::NotFound("This account does not exist".to_string()),
            SessionError::AccountDisabled => ApiError::Forbidden("This account is disabled".to_string()),
            SessionError::InvalidPassword => ApiError::bad_request("Invalid password"),
            SessionError::Revocation(e) => ApiError::server("Server error, cannot invalidate token!", e),
            other => ApiError::server("Server error!", other),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(value: RegistrationError) -> Self {
        match value {
            RegistrationError::Invalid(DomainError::Validation(message)) => ApiError::BadRequest(message),
            RegistrationError::Invalid(other) => ApiError::bad_request(other.to_string()),
            RegistrationError::Duplicate(UniqueField::Email) => ApiError::bad_request("Duplicated email!"),
            RegistrationError::Duplicate(UniqueField::PhoneNumber) => {
                ApiError::bad_request("Duplicated phone number!")
            }
            other => ApiError::server("Server error, cannot register account!", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn client_errors_carry_message_only() {
        let (status, json) = body(SessionError::InvalidPassword.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "success": false, "message": "Invalid password" }));
    }

    #[tokio::test]
    async fn server_errors_include_diagnostic() {
        let err: ApiError = SessionError::Revocation(RevocationError::Unavailable("down".into())).into();
        let (status, json) = body(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Server error, cannot invalidate token!");
        assert_eq!(json["error"], "revocation store unavailable: down");
    }

    #[test]
    fn token_errors_map_to_401() {
        assert!(matches!(ApiError::from(TokenValidationError::Expired), ApiError::TokenExpired));
        assert!(matches!(
            ApiError::from(TokenValidationError::Invalid("bad signature".into())),
            ApiError::TokenInvalid
        ));
        assert_eq!(ApiError::TokenRevoked.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::MissingToken.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn body_rejections_render_as_bad_request() {
        use axum::extract::FromRequest;

        let req = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let rejection = axum::Json::<serde_json::Value>::from_request(req, &()).await.unwrap_err();

        let (status, json) = body(rejection.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "success": false, "message": "Invalid request body" }));
    }

    #[test]
    fn registration_messages_pass_through() {
        let err: ApiError = RegistrationError::Invalid(DomainError::validation("Invalid dob")).into();
        assert_eq!(err.to_string(), "Invalid dob");
        let err: ApiError = RegistrationError::Duplicate(UniqueField::PhoneNumber).into();
        assert_eq!(err.to_string(), "Duplicated phone number!");
    }
}
