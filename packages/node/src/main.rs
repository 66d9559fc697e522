//! `nanopub-submitter-node` — HTTP front door of the nanopublication
//! submission pipeline.
//!
//! # Quick start
//!
//! ```sh
//! # Publish to the default server, stamping with `np` from PATH:
//! nanopub-submitter-node
//!
//! # Two target servers, signing, custom bind address:
//! SUBMITTER_SERVERS=http://a:8080,http://b:8080 \
//! SUBMITTER_SIGN=true SUBMITTER_SIGN_PRIVATE_KEY=/keys/id_dsa \
//! SUBMITTER_BIND=127.0.0.1:3000 nanopub-submitter-node
//! ```
//!
//! # Environment variables
//!
//! See [`SubmitterConfig`] for the full list.

use std::process::ExitCode;
use std::sync::Arc;

use nanopub_submitter_node::{build_router, AppState, LogNotifier, SubmitterConfig, Submitter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "nanopub_submitter_node=info,nanopub_submitter=info,tower_http=debug".into()
            }),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = SubmitterConfig::from_env()?;

    tracing::info!(
        "config: {} target server(s), strategy {:?}, signing {}",
        config.nanopub.servers.len(),
        config.nanopub.target_strategy,
        if config.nanopub.sign_nanopub { "enabled" } else { "disabled" }
    );
    if config.triple_store.enabled {
        tracing::info!(
            "config: triple store {} ({} strategy)",
            config.triple_store.sparql_endpoint,
            config.triple_store.strategy
        );
    }
    if config.tokens.is_empty() {
        tracing::warn!("config: no SUBMITTER_TOKENS set, submissions are unauthenticated");
    }
    tokio::fs::create_dir_all(&config.nanopub.workdir)
        .await
        .map_err(|e| format!("failed to create {}: {e}", config.nanopub.workdir.display()))?;

    let bind_addr = config.bind_addr;
    let submitter = Submitter::from_config(config, Arc::new(LogNotifier))?;
    let app = build_router(AppState::new(submitter));

    tracing::info!("listening on {bind_addr}");
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| format!("failed to bind {bind_addr}: {e}"))?;

    axum::serve(listener, app).await?;
    Ok(())
}
