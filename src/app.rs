//! Process lifecycle: build shared handles, serve, tear down.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api::{router, AppState};
use crate::config::AppConfig;
use crate::extraction::{InsightExtractor, InsightSource, RetryPolicy};
use crate::llm::GeminiClient;
use crate::prompt::PROMPT_VERSION;
use crate::service::AnalysisService;
use crate::store::{RecordStore, SqliteRecordStore};

/// Process-wide handles, created once at startup
pub struct Application {
    store: Arc<SqliteRecordStore>,
    extractor: Arc<InsightExtractor>,
}

impl Application {
    /// Open the pool, ensure the schema, and construct the LLM client.
    pub async fn build(config: &AppConfig) -> Result<Self> {
        info!("startup: creating database pool");
        let store = Arc::new(
            SqliteRecordStore::open(&config.database).context("Failed to create database connection pool")?,
        );
        store.ensure_schema().await.context("Failed to ensure call_records schema")?;

        let generator = GeminiClient::new(&config.llm).context("Failed to construct LLM client")?;
        let extractor = Arc::new(InsightExtractor::new(Arc::new(generator), RetryPolicy::from(&config.llm)));
        info!(prompt_version = PROMPT_VERSION, "startup: LLM client ready");

        Ok(Self { store, extractor })
    }

    /// Shared record store handle
    pub fn store(&self) -> Arc<SqliteRecordStore> {
        Arc::clone(&self.store)
    }

    /// Request handler wired to this application's handles
    pub fn service(&self) -> AnalysisService {
        AnalysisService::new(
            Arc::clone(&self.extractor) as Arc<dyn InsightSource>,
            Some(Arc::clone(&self.store) as Arc<dyn RecordStore>),
        )
    }

    /// Bind `address` and serve. A bind failure still runs the shutdown
    /// sequence before the error is returned.
    pub async fn bind_and_serve(self, address: &str) -> Result<()> {
        match TcpListener::bind(address).await {
            Ok(listener) => self.serve(listener).await,
            Err(e) => {
                error!(address, error = %e, "startup: failed to bind listener");
                self.shutdown().await;
                Err(e).with_context(|| format!("Failed to bind {address}"))
            },
        }
    }

    /// Serve until Ctrl-C or SIGTERM, then shut down.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let app = router(AppState {
            service: Arc::new(self.service()),
        });

        info!(address = %listener.local_addr()?, "server listening");
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error");

        self.shutdown().await;
        served
    }

    /// Release the LLM client, then close the database pool.
    pub async fn shutdown(self) {
        let Self { store, extractor } = self;

        info!("shutdown: closing LLM client");
        drop(extractor);

        store.close().await;
        info!("shutdown: complete");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
