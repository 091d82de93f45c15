use axum::{
    extract::rejection::JsonRejection, routing::post, Extension, Json, Router,
};
use serde::Deserialize;

use super::roast_service::{validate_target, RoastResponse};
use crate::{
    app_module::AppState,
    error::ApiError,
    prompts::roast_prompt::{RoastTier, Tone},
};

#[derive(Debug, Deserialize)]
pub struct RoastRequest {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

pub fn roast_router() -> Router {
    Router::new()
        .route("/roast", post(roast))
        .route("/premium-roast", post(premium_roast))
}

pub async fn roast(
    Extension(ctx): Extension<AppState>,
    payload: Result<Json<RoastRequest>, JsonRejection>,
) -> Result<Json<RoastResponse>, ApiError> {
    let Json(request) = payload?;
    let target = validate_target(request.target.as_deref().unwrap_or_default())?;

    let response = ctx
        .service
        .roast_service
        .generate(RoastTier::Free, target, request.tone)
        .await?;

    Ok(Json(response))
}

pub async fn premium_roast(
    Extension(ctx): Extension<AppState>,
    payload: Result<Json<RoastRequest>, JsonRejection>,
) -> Result<Json<RoastResponse>, ApiError> {
    let Json(request) = payload?;
    let target = validate_target(request.target.as_deref().unwrap_or_default())?;

    match &ctx.service.checkout_service {
        Some(gateway) => {
            let session_id = request
                .session_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or(ApiError::MissingSessionId(
                    "Ontbrekende session_id voor premium roast.",
                ))?;

            let paid = gateway.is_paid(session_id).await.map_err(|e| {
                tracing::error!("Error verifying checkout session for premium roast: {:#}", e);
                ApiError::Generation("Fout bij premium generatie.")
            })?;

            if !paid {
                return Err(ApiError::PaymentRequired);
            }
        }
        None if ctx.config.premium_demo_mode => {
            tracing::warn!("Stripe not configured, serving premium roast in demo mode");
        }
        None => {
            return Err(ApiError::PaymentsNotConfigured(
                "Stripe niet geconfigureerd op deze server.",
            ));
        }
    }

    let response = ctx
        .service
        .roast_service
        .generate(RoastTier::Premium, target, request.tone)
        .await?;

    Ok(Json(response))
}
