//! HTTP API for the catalog
//!
//! JSON endpoints for browsing categories, searching by tag, playing a clip
//! through a freshly signed URL and uploading new clips.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::error::{CatalogError, Result};
use crate::search::TagSearch;
use crate::storage::Storage;
use crate::thumbnail::FrameExtractor;
use bjj_core::CloudFrontSigner;

pub mod handlers;
pub mod models;
pub mod server;

/// State shared by every request handler
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub storage: Storage,
    pub extractor: Option<Arc<dyn FrameExtractor>>,
    pub search: TagSearch,
    signer: OnceCell<CloudFrontSigner>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        db: Database,
        storage: Storage,
        extractor: Option<Arc<dyn FrameExtractor>>,
    ) -> Self {
        Self {
            search: TagSearch::new(&config.search),
            config,
            db,
            storage,
            extractor,
            signer: OnceCell::new(),
        }
    }

    /// Use an already constructed signer instead of loading the key file
    pub fn with_signer(self, signer: CloudFrontSigner) -> Self {
        Self {
            signer: OnceCell::new_with(Some(signer)),
            ..self
        }
    }

    /// The CloudFront signer, loaded on first use.
    ///
    /// A failed load is not cached, so fixing the key file takes effect
    /// without a restart.
    pub async fn signer(&self) -> Result<&CloudFrontSigner> {
        self.signer
            .get_or_try_init(|| async {
                let cdn = &self.config.cdn;
                let signer = CloudFrontSigner::from_key_file(
                    cdn.domain.as_deref(),
                    cdn.key_pair_id.as_deref(),
                    cdn.private_key_file.as_deref(),
                )?;
                info!("🔑 CloudFront signer ready for {}", signer.domain());
                Ok::<_, CatalogError>(signer)
            })
            .await
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("storage", &self.storage)
            .field("signer_loaded", &self.signer.initialized())
            .finish_non_exhaustive()
    }
}

/// API server bound to the configured address
#[derive(Debug)]
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the API server in the background
    pub fn start_background(self) -> JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.start().await })
    }

    /// Serve until the process is stopped
    pub async fn start(self) -> anyhow::Result<()> {
        let server = &self.state.config.server;
        let address = format!("{}:{}", server.host, server.port);
        info!("🚀 Starting API server on {}", address);

        server::start_http_server(self.state, &address).await
    }
}
