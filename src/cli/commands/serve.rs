//! Implementation of the `taskchat serve` command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use crate::adapters::completion::AnthropicCompletionClient;
use crate::adapters::http::{build_router, serve_with_shutdown, AppState};
use crate::adapters::sqlite::{initialize_database, PoolConfig};
use crate::cli::types::ServeArgs;
use crate::domain::ports::CompletionClient;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;
use crate::services::tool_catalog;

pub async fn execute(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = ConfigLoader::load(config_path).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let _logger = LoggerImpl::init(&config.logging).context("Failed to initialize logging")?;

    tool_catalog::verify().context("Tool catalog is inconsistent")?;

    let pool = initialize_database(
        &config.database.url(),
        Some(PoolConfig {
            max_connections: config.database.max_connections,
            ..PoolConfig::default()
        }),
    )
    .await
    .context("Failed to initialize database")?;

    let completion: Arc<dyn CompletionClient> = Arc::new(
        AnthropicCompletionClient::new(&config.completion, &config.retry)
            .context("Failed to configure completion client")?,
    );

    tracing::info!(
        database = %config.database.path,
        model = %config.completion.model,
        history_limit = config.chat.history_limit,
        max_tool_iterations = config.chat.max_tool_iterations,
        "starting taskchat"
    );

    let state = AppState::new(pool.clone(), completion, &config);
    let router = build_router(state, &config.server.cors_origins);

    serve_with_shutdown(router, &config.server.host, config.server.port, shutdown_signal())
        .await
        .map_err(|e| anyhow!("HTTP server failed: {e}"))?;

    pool.close().await;
    tracing::info!("taskchat stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
