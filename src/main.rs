use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ride_relay::config::AppConfig;
use ride_relay::handlers;
use ride_relay::services::scheduling::calcom::CalComProvider;
use ride_relay::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.cal_api_key.is_empty() {
        tracing::warn!("CAL_API_KEY is not set; bookings will be rejected upstream");
    }
    if config.signature_required() {
        tracing::info!("webhook signature verification enabled");
    } else {
        tracing::warn!("RETELL_API_KEY is not set; accepting unsigned webhooks");
    }
    tracing::info!(policy = ?config.policy, "relay policy");

    let scheduler = CalComProvider::new(
        config.cal_api_key.clone(),
        config.cal_api_url.clone(),
        config.cal_api_version.clone(),
        config.cal_timeout,
    )?;

    let state = Arc::new(AppState {
        config: config.clone(),
        scheduler: Box::new(scheduler),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/retell", post(handlers::booking::booking_webhook))
        .layer(CatchPanicLayer::custom(handlers::booking::panic_reply(
            config.policy.response_style,
        )))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
