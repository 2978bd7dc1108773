// src/main.rs

use quiz_forge::config::Config;
use quiz_forge::routes;
use quiz_forge::services::gemini::GeminiClient;
use quiz_forge::services::tunnel::{self, NgrokAgent, Tunnel};
use quiz_forge::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (and .env, if present)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily("logs", "server.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    tracing::info!("Starting with {:?}", config);

    // One HTTP client for the model and the tunnel agent
    let http = reqwest::Client::new();
    let gemini = GeminiClient::new(http.clone(), &config)?;

    let state = AppState::new(config.clone(), Arc::new(gemini));
    let app = routes::create_router(state);

    let agent = config
        .ngrok_authtoken
        .as_deref()
        .map(|token| NgrokAgent::new(http.clone(), &config.ngrok_api_url, &config.ngrok_bin, token));

    if let Some(agent) = &agent {
        match agent.teardown().await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Closed {} stale tunnel(s)", n),
            Err(e) => tracing::warn!("Failed to tear down existing tunnels: {}", e),
        }
    }

    // Bind to the listening address
    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    // Kept alive until shutdown; dropping it stops a spawned agent
    let _tunnel: Option<Tunnel> = match &agent {
        Some(agent) => match agent.open(config.port).await {
            Ok(tunnel) => {
                println!("{}", tunnel::banner(&tunnel.public_url));
                tracing::info!(
                    "Tunnel ready (agent {})",
                    if tunnel.owns_agent() { "spawned" } else { "reused" }
                );
                Some(tunnel)
            }
            Err(e) => {
                tracing::error!("Tunnel provisioning failed, serving locally only: {}", e);
                None
            }
        },
        None => {
            tracing::warn!("NGROK_AUTHTOKEN not set, skipping public tunnel");
            None
        }
    };

    // Start the server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
