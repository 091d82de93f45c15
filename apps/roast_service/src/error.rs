use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "Te veel verzoeken; probeer het over een minuut opnieuw.";

/// Every failure a caller can see. The message is the whole contract: there is
/// no machine-readable code beyond the HTTP status.
#[derive(Error, Debug, PartialEq)]
pub enum ApiError {
    #[error("Ongeldig verzoek: {0}")]
    InvalidRequest(String),

    #[error("Geef een target op.")]
    MissingTarget,

    #[error("Target geblokkeerd.")]
    TargetBlocked,

    #[error("{0}")]
    MissingSessionId(&'static str),

    #[error("Betaling niet bevestigd.")]
    PaymentRequired,

    #[error("{0}")]
    PaymentsNotConfigured(&'static str),

    #[error("{0}")]
    OutputBlocked(&'static str),

    #[error("{0}")]
    Generation(&'static str),

    #[error("{0}")]
    Checkout(&'static str),

    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::MissingTarget
            | ApiError::TargetBlocked
            | ApiError::MissingSessionId(_) => StatusCode::BAD_REQUEST,
            ApiError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::PaymentsNotConfigured(_)
            | ApiError::OutputBlocked(_)
            | ApiError::Generation(_)
            | ApiError::Checkout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(ApiError::MissingTarget.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::TargetBlocked.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::PaymentRequired.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ApiError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Generation("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn renders_error_body() {
        let response = ApiError::TargetBlocked.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Target geblokkeerd.");
    }
}
