//! Bot relay gateway server binary.
//!
//! Listen settings come from flags or the environment; gateway settings
//! (upstream credentials, timeouts, bot registry) are read by
//! `GatewayConfig::from_env` after `.env` has been loaded.

use botrelay_api::AppState;
use botrelay_api::config::ApiConfig;
use botrelay_api::routes;
use botrelay_core::config::GatewayConfig;
use botrelay_core::gateway::Gateway;
use clap::{ArgAction, Parser};
use clap::builder::BoolishValueParser;
use tracing::{info, warn};

/// CLI arguments for the gateway server.
#[derive(Parser, Debug)]
#[command(name = "botrelay_server", version, about = "Bot relay gateway server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Log every request's method, path and (at debug level) body.
    #[arg(
        long,
        env = "LOG_REQUESTS",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    log_requests: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,botrelay_api=debug,botrelay_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let gateway_config = GatewayConfig::from_env()?;
    if gateway_config.openai.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; every chat request will be served from fallback replies");
    }
    info!(
        model = %gateway_config.openai.model,
        base_url = %gateway_config.openai.base_url,
        timeout_secs = gateway_config.upstream_timeout.as_secs(),
        retries = gateway_config.upstream_retries,
        fallback_enabled = gateway_config.fallback_enabled,
        bots = ?gateway_config.registry.ids(),
        "gateway configured"
    );

    let config = ApiConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        log_requests: args.log_requests,
    };

    let state = AppState::new(Gateway::from_config(gateway_config), config.clone());
    let app = botrelay_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, "REST API listening");
    info!("available endpoints:");
    info!("  GET  {}", routes::GET_API_HEALTH);
    info!("  GET  {}", routes::API_CHAT);
    info!("  POST {}", routes::API_CHAT);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
