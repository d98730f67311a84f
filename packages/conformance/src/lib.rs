//! Shared helpers for the Tether conformance test suite.
//!
//! Provides [`spawn_node`], which binds a `TcpListener` on an ephemeral port,
//! wires up an in-process node backed by `MemoryStorage`, and returns both the
//! local URL and the underlying storage so tests can pre-populate data without
//! going through the HTTP layer. [`spawn_node_with`] does the same for any
//! storage backend.

use std::sync::Arc;

use tether_node::{build_router, storage::memory::MemoryStorage, NodeConfig, Storage};

/// Start an ephemeral in-process node and return `(base_url, storage)`.
///
/// The node runs in a background `tokio` task and is bound to an OS-assigned
/// port on `127.0.0.1`. The returned `String` is the base URL, e.g.
/// `http://127.0.0.1:51234`.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound.
pub async fn spawn_node() -> (String, Arc<MemoryStorage>) {
    let mem_storage = Arc::new(MemoryStorage::new());
    let base_url = spawn_node_with(Arc::clone(&mem_storage) as Arc<dyn Storage>).await;
    (base_url, mem_storage)
}

/// Start an ephemeral in-process node over `storage` and return its base URL.
///
/// The node reads the actor from the default `x-actor-id` header.
pub async fn spawn_node_with(storage: Arc<dyn Storage>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");

    let config = NodeConfig {
        bind_addr: addr,
        ..NodeConfig::default()
    };
    let router = build_router(storage, config);

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance node error");
    });

    format!("http://{addr}")
}
