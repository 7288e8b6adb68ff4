//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a migrated in-memory store, a
//! temporary static root, and a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::response::Response;
use casecraft::config::Config;
use casecraft::server::{create_router, AppContext};
use casecraft_db::{ImageStore, SqliteStore};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestHarness {
    pub ctx: AppContext,
    pub store: SqliteStore,
    pub static_root: TempDir,
}

impl TestHarness {
    /// Default configuration pointed at an empty temporary static root.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Custom configuration; `static_dir` is replaced by a temporary
    /// directory.
    pub fn with_config(mut config: Config) -> Self {
        let static_root = tempfile::tempdir().expect("failed to create static root");
        config.server.static_dir = static_root.path().to_path_buf();

        let store = SqliteStore::in_memory().expect("failed to create in-memory store");
        store.migrate().expect("failed to migrate");

        let ctx = AppContext::new(config, Arc::new(store.clone()));
        Self {
            ctx,
            store,
            static_root,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn root(&self) -> &Path {
        self.static_root.path()
    }

    /// Write a file under the static root, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn mkdir(&self, rel: &str) {
        std::fs::create_dir_all(self.root().join(rel)).unwrap();
    }

    /// Send a request through the router without binding a socket.
    pub async fn request(&self, method: &str, uri: &str) -> Response {
        self.request_with_headers(method, uri, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: &str,
        uri: &str,
        headers: &[(HeaderName, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }

        create_router(self.ctx.clone())
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request("GET", uri).await
    }
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_string(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
