//! Request authentication and role gating.
//!
//! `auth_middleware` walks a token through its checks in order: presence,
//! signature and time window, then revocation. The first failing check
//! answers the request. `signed_token_middleware` stops before revocation;
//! logout uses it and treats an already revoked token as done.
//! `require_role` is a separate layer that runs after `auth_middleware` on
//! role-gated routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use storefront_auth::{authorize, RolePolicy, TokenClaims, TokenValidator};
use storefront_infra::revocation::RevocationClient;

use crate::app::errors::ApiError;
use crate::context::{AuthToken, PrincipalContext};

/// Header carrying the raw token.
pub const AUTH_TOKEN_HEADER: &str = "auth_token";

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenValidator>,
    pub revocations: RevocationClient,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (token, claims) = verify_signed_token(&state, req.headers())?;

    if state.revocations.is_revoked(&token).await? {
        tracing::debug!(sub = %claims.sub, "revoked token presented");
        return Err(ApiError::TokenRevoked);
    }

    attach_principal(&mut req, token, claims);
    Ok(next.run(req).await)
}

/// Presence, signature and time window only. The handler behind it decides
/// what a revoked token means.
pub async fn signed_token_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (token, claims) = verify_signed_token(&state, req.headers())?;
    attach_principal(&mut req, token, claims);
    Ok(next.run(req).await)
}

fn verify_signed_token(
    state: &AuthState,
    headers: &HeaderMap,
) -> Result<(String, TokenClaims), ApiError> {
    let token = extract_token(headers)?.to_string();
    let claims = state.tokens.validate(&token, Utc::now()).map_err(|e| {
        tracing::debug!(reason = %e, "token rejected");
        ApiError::from(e)
    })?;
    Ok((token, claims))
}

fn attach_principal(req: &mut Request, token: String, claims: TokenClaims) {
    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, claims.role));
    req.extensions_mut().insert(AuthToken::new(token, claims));
}

/// Reject principals whose role is outside `policy`.
///
/// Must be layered inside `auth_middleware`; a request without a principal is
/// treated as unauthenticated.
pub async fn require_role(
    State(policy): State<RolePolicy>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<PrincipalContext>()
        .copied()
        .ok_or(ApiError::MissingToken)?;

    authorize(&policy, principal.role()).map_err(|e| {
        tracing::warn!(account_id = %principal.account_id(), reason = %e, "role check failed");
        ApiError::RoleDenied
    })?;

    Ok(next.run(req).await)
}

fn extract_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTH_TOKEN_HEADER)
        .ok_or(ApiError::MissingToken)?;

    // A header that is not visible ASCII cannot be a token we issued.
    let value = value.to_str().map_err(|_| ApiError::TokenInvalid)?;

    let token = value.trim();
    if token.is_empty() {
        return Err(ApiError::MissingToken);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_header_extraction() {
        let mut headers = HeaderMap::new();
        assert!(matches!(extract_token(&headers), Err(ApiError::MissingToken)));

        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("   "));
        assert!(matches!(extract_token(&headers), Err(ApiError::MissingToken)));

        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static(" abc.def.ghi "));
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }
}
