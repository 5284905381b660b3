use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use storefront_auth::{AccountSummary, CustomerRegistration};

use crate::app::dto::{Envelope, WhoAmI};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn register_customer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<CustomerRegistration>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<AccountSummary>>), ApiError> {
    let Json(body) = body?;
    let summary = services.accounts.register_customer(body, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(Envelope::with_data("Account registered!", summary))))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Envelope<Vec<AccountSummary>>>, ApiError> {
    let customers = services.accounts.list_customers().await?;
    Ok(Json(Envelope::with_data("Customers retrieved", customers)))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Json<Envelope<WhoAmI>>, ApiError> {
    // The account may have been removed since the token was issued.
    let name = services
        .accounts
        .find(principal.account_id())
        .await?
        .map(|account| account.display_name().to_string());

    Ok(Json(Envelope::with_data(
        "Authenticated",
        WhoAmI {
            account_id: principal.account_id(),
            role: principal.role(),
            name,
        },
    )))
}
