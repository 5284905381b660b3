use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use storefront_auth::RolePolicy;

use crate::middleware::{self, AuthState};

pub mod accounts;
pub mod session;
pub mod system;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/login", post(session::login))
        .route("/customers/register", post(accounts::register_customer))
}

/// Routes behind the auth middleware; some are further gated by role.
///
/// `/logout` only needs a correctly signed, unexpired token so that a repeated
/// or concurrent logout with the same token still succeeds.
pub fn protected_router(auth: AuthState) -> Router {
    let back_office = Router::new()
        .route("/customers", get(accounts::list_customers))
        .route_layer(from_fn_with_state(RolePolicy::back_office(), middleware::require_role));

    let logout = Router::new()
        .route("/logout", get(session::logout))
        .route_layer(from_fn_with_state(auth.clone(), middleware::signed_token_middleware));

    Router::new()
        .route("/me", get(accounts::me))
        .merge(back_office)
        .route_layer(from_fn_with_state(auth, middleware::auth_middleware))
        .merge(logout)
}
