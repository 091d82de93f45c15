use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{app_module::AppState, error::ApiError};

/// The peer address, or the leftmost X-Forwarded-For entry when the proxy is
/// trusted. "unknown" when neither is available.
pub fn client_identity(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn enforce_rate_limit(
    State(ctx): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_identity(&request, ctx.config.server.trust_proxy);

    if ctx.rate_limiter.check(&client) {
        next.run(request).await
    } else {
        tracing::warn!("Rate limit exceeded for {} on {}", client, request.uri().path());
        ApiError::RateLimited.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http};

    fn forwarded_from_peer() -> Request {
        let mut request = http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 51000))));
        request
    }

    #[test]
    fn uses_peer_address_by_default() {
        assert_eq!(client_identity(&forwarded_from_peer(), false), "192.0.2.1");
    }

    #[test]
    fn trusted_proxy_uses_forwarded_header() {
        assert_eq!(client_identity(&forwarded_from_peer(), true), "203.0.113.7");
    }

    #[test]
    fn trusted_proxy_without_header_uses_peer_address() {
        let mut request = http::Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 51000))));

        assert_eq!(client_identity(&request, true), "192.0.2.1");
    }

    #[test]
    fn unknown_without_any_hint() {
        let request = http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_identity(&request, false), "unknown");
    }
}
