mod bypass;
mod client_key;
mod config;
mod error;
mod generator;
mod handlers;
mod janitor;
mod metrics;
mod rate_limit;
mod state;

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bypass::BypassList;
use config::Args;
use generator::UpstreamGenerator;
use rate_limit::RateLimiter;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clip_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();

    // bypass list is fixed before the first request is served
    let bypass = BypassList::load(&args.bypass_ips);
    if !bypass.is_empty() {
        info!(count = bypass.len(), "Rate limit bypass list loaded");
    }

    let limiter = Arc::new(RateLimiter::new(
        args.rate_limit as usize,
        args.rate_window(),
        bypass,
    ));
    info!(
        limit = limiter.limit(),
        window_secs = limiter.window().as_secs(),
        "Rate limit per client"
    );

    let generator = UpstreamGenerator::new(
        reqwest::Client::new(),
        &args.generator_url,
        args.generator_timeout(),
    );
    info!(url = generator.base_url(), "Forwarding media requests");

    let shutdown = CancellationToken::new();
    let janitor = janitor::spawn_janitor(
        Arc::clone(&limiter),
        args.cleanup_interval(),
        shutdown.clone(),
    );

    let state = AppState {
        limiter,
        generator: Arc::new(generator),
    };
    let app = handlers::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "Server running");

    // peer addresses are needed to key clients without proxy headers
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    .context("server failed")?;

    shutdown.cancel();
    janitor.await.context("janitor task panicked")?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
    shutdown.cancel();
}
