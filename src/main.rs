use anyhow::Context;
use chat_gateway::{
    clock::SystemClock,
    config::Args,
    gateway::OpenAiGateway,
    ledger::{Ledger, LedgerMode},
    router,
    state::AppState,
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    // fail fast without a key
    let api_key = args.api_key()?;
    let gateway = OpenAiGateway::new(
        &args.upstream_url,
        api_key,
        args.model.clone(),
        args.upstream_timeout(),
    )
    .context("failed to build completion client")?;

    info!("Forwarding to {} (model {})", gateway.endpoint(), args.model);

    let state = Arc::new(AppState {
        gateway: Arc::new(gateway),
        ledger: Ledger::new(args.ledger),
        policy: args.policy(),
        system_prompt: args.system_prompt.clone(),
        clock: Arc::new(SystemClock),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Gateway running on http://localhost:{}", args.port);
    info!(
        "Rate limit: {} requests per {} seconds ({} ledger)",
        args.rate_limit,
        args.rate_window,
        match args.ledger {
            LedgerMode::Cookie => "cookie",
            LedgerMode::Memory => "memory",
        }
    );
    info!("Upstream timeout: {} seconds", args.upstream_timeout);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
