use axum::{
    error_handling::HandleErrorLayer, http::StatusCode, middleware, BoxError, Extension, Json,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    app_module::AppState, checkout::checkout_controller::checkout_router,
    rate_limit::rate_limit_middleware::enforce_rate_limit,
    roast::roast_controller::roast_router,
};

pub fn application_router(state: &AppState) -> Router {
    let api = Router::new()
        .merge(roast_router())
        .merge(checkout_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ));

    let static_dir = &state.config.server.static_dir;

    Router::new()
        .nest("/api", api)
        .route_service("/success", ServeFile::new(static_dir.join("success.html")))
        .fallback_service(ServeDir::new(static_dir))
}

/// The full service: routes plus timeout, tracing, shared state and CORS.
pub fn build_app(state: AppState) -> Router {
    let request_timeout = state.config.server.request_timeout;

    Router::new().merge(application_router(&state)).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|error: BoxError| async move {
                if error.is::<tower::timeout::error::Elapsed>() {
                    (
                        StatusCode::REQUEST_TIMEOUT,
                        Json(serde_json::json!({ "error": "Het verzoek duurde te lang." })),
                    )
                } else {
                    tracing::error!("Unhandled internal error: {}", error);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({ "error": "Interne fout." })),
                    )
                }
            }))
            .timeout(request_timeout)
            .layer(TraceLayer::new_for_http())
            .layer(Extension(state))
            .layer(
                CorsLayer::new()
                    .allow_origin(tower_http::cors::Any)
                    .allow_methods(tower_http::cors::Any)
                    .allow_headers(tower_http::cors::Any),
            )
            .into_inner(),
    )
}
