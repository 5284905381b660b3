use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::app::dto::{Envelope, LoginData, LoginRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::AuthToken;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<LoginData>>), ApiError> {
    let Json(body) = body?;
    let outcome = services
        .sessions
        .login(&body.email, &body.password, Utc::now())
        .await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::with_data(
            "Logged in successfully",
            LoginData {
                token: outcome.token,
                name: outcome.name,
            },
        )),
    ))
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<Envelope<()>>, ApiError> {
    services
        .sessions
        .logout(token.raw(), token.claims(), Utc::now())
        .await?;

    Ok(Json(Envelope::message("Logged out successfully!")))
}
