use axum::{
    extract::{rejection::QueryRejection, Query},
    http::{header::ORIGIN, HeaderMap},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{app_module::AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifySessionQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifySessionResponse {
    pub paid: bool,
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

pub fn checkout_router() -> Router {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/verify-session", get(verify_session))
}

pub async fn create_checkout_session(
    Extension(ctx): Extension<AppState>,
    headers: HeaderMap,
) -> Result<Json<CheckoutSessionResponse>, ApiError> {
    let gateway = ctx.service.checkout_service.as_ref().ok_or(
        ApiError::PaymentsNotConfigured("Stripe niet geconfigureerd op deze server."),
    )?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let cancel_url = format!("{}/", origin);

    let url = gateway.create_session(&cancel_url).await.map_err(|e| {
        tracing::error!("Error creating checkout session: {:#}", e);
        ApiError::Checkout("Kon geen checkout sessie aanmaken.")
    })?;

    Ok(Json(CheckoutSessionResponse { url }))
}

pub async fn verify_session(
    Extension(ctx): Extension<AppState>,
    query: Result<Query<VerifySessionQuery>, QueryRejection>,
) -> Result<Json<VerifySessionResponse>, ApiError> {
    let gateway = ctx
        .service
        .checkout_service
        .as_ref()
        .ok_or(ApiError::PaymentsNotConfigured("Stripe niet geconfigureerd."))?;

    let Query(query) = query?;
    let session_id = query
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingSessionId("Geen session_id meegegeven."))?;

    let paid = gateway.is_paid(session_id).await.map_err(|e| {
        tracing::error!("Error verifying checkout session: {:#}", e);
        ApiError::Checkout("Kon sessie niet verifiëren.")
    })?;

    Ok(Json(VerifySessionResponse { paid }))
}
