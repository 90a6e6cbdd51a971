//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which owns a temporary provider directory, a
//! config pointing at it and a full [`AppContext`]. The [`with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use tempfile::TempDir;
use tokio::sync::oneshot;

use yuzu::config::Config;
use yuzu::metadata::PlaceholderPolicy;
use yuzu::server::{create_router, serve, AppContext};

/// Test harness wrapping an [`AppContext`] backed by a temporary provider
/// directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestHarness {
    /// Create a harness with an empty provider directory and the watcher
    /// disabled.
    pub fn new() -> Self {
        Self::with_policy(PlaceholderPolicy::PassThrough)
    }

    pub fn with_policy(policy: PlaceholderPolicy) -> Self {
        let dir = TempDir::new().expect("failed to create provider dir");
        let mut config = Config::default();
        config.providers.dirs = vec![dir.path().to_path_buf()];
        config.providers.unresolved_placeholders = policy;
        config.watch.enabled = false;

        let ctx = AppContext::new(config).expect("failed to build context");
        Self {
            ctx,
            dir,
            shutdown: None,
        }
    }

    /// Write a definition file into the provider directory.
    pub fn write_provider(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, body).expect("failed to write provider");
        path
    }

    /// Bulk-load the provider directory into the registry.
    pub fn load(&self) -> usize {
        self.ctx.registry.load_dirs(&self.ctx.config.providers.dirs)
    }

    pub fn router(&self) -> axum::Router {
        create_router(self.ctx.clone())
    }

    /// Start the full server on a random port. Providers already written are
    /// bulk-loaded by the server itself.
    pub async fn with_server(mut self) -> (Self, SocketAddr) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        let (tx, rx) = oneshot::channel::<()>();
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            serve(listener, ctx, async move {
                rx.await.ok();
            })
            .await
            .ok();
        });

        self.shutdown = Some(tx);
        (self, addr)
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// A provider definition whose endpoints point at `base`.
pub fn two_step_provider(id: &str, base: &str, output_type: &str) -> String {
    format!(
        r#"{{
            "id": "{id}",
            "inputs": {{ "series": "{{series}}", "chapter": "{{chapter}}" }},
            "vars": {{ "{{base}}": "{base}" }},
            "endpoints": [
                {{
                    "method": "GET",
                    "url": "{{base}}/manga",
                    "params": {{ "filter[text]": "{{series}}" }},
                    "result": {{ "{{mangaId}}": "$.data[0].id" }}
                }},
                {{
                    "method": "GET",
                    "url": "{{base}}/manga/{{mangaId}}/chapters",
                    "params": {{ "filter[number]": "{{chapter}}" }},
                    "result": {{
                        "{{title}}": "$.data[0].attributes.canonicalTitle",
                        "{{volume}}": "$.data[0].attributes.volumeNumber"
                    }}
                }}
            ],
            "output": {{
                "type": "{output_type}",
                "content": {{
                    "Title": "{{title}}",
                    "Series": "{{series}}",
                    "Number": "{{chapter}}",
                    "Volume": "{{volume}}"
                }}
            }}
        }}"#
    )
}
