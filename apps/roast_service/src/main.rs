use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use roast_service::{app_module::AppState, app_router::build_app, config::AppConfig};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let subscriber_builder = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_level(true)
        .with_span_events(FmtSpan::CLOSE);

    if config.is_dev() {
        tracing::subscriber::set_global_default(
            subscriber_builder.pretty().with_ansi(true).finish(),
        )
        .context("setting dev subscriber failed")
    } else {
        tracing::subscriber::set_global_default(
            subscriber_builder.json().with_ansi(false).finish(),
        )
        .context("setting prod subscriber failed")
    }
}

fn log_modes(config: &AppConfig) {
    if config.openai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, roasts come from the offline fallback list");
    } else {
        tracing::info!("Generating roasts with model {}", config.openai.model);
    }

    match (config.payments_enabled(), config.premium_demo_mode) {
        (true, _) => tracing::info!("Stripe checkout enabled, premium roasts require payment"),
        (false, true) => tracing::warn!(
            "STRIPE_SECRET_KEY not set and PREMIUM_DEMO_MODE on: premium roasts are served without payment"
        ),
        (false, false) => tracing::warn!(
            "STRIPE_SECRET_KEY not set, checkout and premium roasts are disabled"
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(&config)?;
    log_modes(&config);

    let port = config.server.port;
    let state = AppState::new(config);

    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(rate_limiter.window());
        loop {
            interval.tick().await;
            rate_limiter.prune();
        }
    });

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))
        .await
        .with_context(|| format!("unable to bind port {}", port))?;

    tracing::info!("Server started, listening on port {}", port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
