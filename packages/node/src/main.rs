//! `tether-node` — Tether follow-graph service.
//!
//! # Quick start
//!
//! ```sh
//! # In-memory node on the default port:
//! tether-node
//!
//! # Persistent SQLite node:
//! TETHER_DB=./tether.db tether-node
//!
//! # Custom bind address and actor header:
//! TETHER_BIND=127.0.0.1:8080 TETHER_ACTOR_HEADER=x-user-id tether-node
//! ```
//!
//! # Environment variables
//!
//! See [`NodeConfig::from_env`] for the full list.

use std::process::ExitCode;
use std::sync::Arc;

use tether_node::{build_router, MemoryStorage, NodeConfig, SqliteStorage, Storage};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether_node=info,tower_http=debug".into()),
        )
        .init();

    let config = match NodeConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let storage: Arc<dyn Storage> = match &config.db_path {
        Some(path) => match SqliteStorage::open(path) {
            Ok(s) => {
                tracing::info!("storage: SQLite at {path}");
                Arc::new(s)
            }
            Err(e) => {
                tracing::error!("failed to open SQLite database at {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            tracing::info!("storage: in-memory (data will not survive restart)");
            Arc::new(MemoryStorage::new())
        }
    };

    tracing::info!(
        actor_header = %config.actor_header,
        store_timeout = ?config.store_timeout,
        "listening on {}",
        config.bind_addr
    );
    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind {}: {e}", config.bind_addr);
            return ExitCode::FAILURE;
        }
    };

    let app = build_router(storage, config);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
