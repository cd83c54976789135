// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

use std::net::SocketAddr;
use std::process;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use todo_api_server::api::router;
use todo_api_server::auth::TokenVerifier;
use todo_api_server::cleanup::CleanupJob;
use todo_api_server::config::{AppConfig, LogFormat};
use todo_api_server::state::AppState;
use todo_api_server::storage::ObjectStore;

#[tokio::main]
async fn main() {
    // Configuration before logging so LOG_FORMAT can take effect, with
    // load failures reported on stderr.
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            process::exit(1);
        }
    };

    init_tracing(config.log_format);

    let objects = match ObjectStore::from_config(&config).await {
        Ok(objects) => objects,
        Err(e) => {
            error!(error = %e, "failed to initialize storage backend");
            process::exit(1);
        }
    };

    let verifier = TokenVerifier::from_settings(&config.auth);
    let state = AppState::new(verifier, objects);

    let shutdown = CancellationToken::new();
    if let Some(interval) = config.cleanup_interval {
        let job = CleanupJob::new(state.store.clone(), state.objects.clone(), interval);
        tokio::spawn(job.run(shutdown.clone()));
    }

    let app = router(state);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(host = %config.host, port = config.port, error = %e, "invalid bind address");
            process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };

    info!(%addr, "Todo API server listening (docs at /docs)");

    let serve_shutdown = shutdown.clone();
    let result = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            serve_shutdown.cancel();
        })
        .await;

    if let Err(e) = result {
        error!(error = %e, "server error");
        process::exit(1);
    }

    info!("Todo API server stopped");
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        // Without a signal handler the only way out is external; park here.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
