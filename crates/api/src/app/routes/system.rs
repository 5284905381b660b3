use axum::{http::StatusCode, Json};

use crate::app::dto::Envelope;

pub async fn health() -> (StatusCode, Json<Envelope<()>>) {
    (StatusCode::OK, Json(Envelope::message("ok")))
}
