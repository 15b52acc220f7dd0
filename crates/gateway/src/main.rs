use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use sm_domain::config::Config;
use sm_gateway::api;
use sm_gateway::bootstrap;
use sm_gateway::cli::{Cli, Command, ConfigCommand};
use sm_gateway::telemetry::Telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            let (config, _config_path) = sm_gateway::cli::load_config()?;
            let telemetry = Telemetry::init_server(&config.observability);
            let result = run_server(Arc::new(config)).await;
            telemetry.shutdown();
            result
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = sm_gateway::cli::load_config()?;
            if !sm_gateway::cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = sm_gateway::cli::load_config()?;
            print!("{}", sm_gateway::cli::config::show(&config)?);
            Ok(())
        }
        Some(Command::Complete(args)) => {
            let _telemetry = Telemetry::init_cli();
            let (config, _) = sm_gateway::cli::load_config()?;
            sm_gateway::cli::complete::run(Arc::new(config), args).await
        }
        Some(Command::Version) => {
            println!("solmind {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Start the gateway server with the given configuration.
async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("SolMind starting");

    let state = bootstrap::build_app_state(config.clone()).await?;

    // ── Layers ───────────────────────────────────────────────────────
    let cors_layer = api::cors::cors_layer(&config.server.cors);
    let max_concurrent = config.server.max_concurrent_requests;
    tracing::info!(max_concurrent, "concurrency limit set");

    let app = api::router()
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state.clone());

    // ── Bind ─────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "SolMind listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    // ── Post-shutdown flush ─────────────────────────────────────────
    tracing::info!("server stopped, draining memory persistence queue...");
    state.orchestrator.shutdown().await;
    tracing::info!("shutdown complete");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM and starts graceful shutdown.
async fn shutdown_signal() {
    let signal = tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = terminate() => "SIGTERM",
    };
    tracing::info!(signal, "shutting down, finishing in-flight completions");
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
