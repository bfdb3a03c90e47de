//! Process-wide wiring: catalog backend, repository, use cases and caches.
//!
//! Built once at start-up and handed around as `Arc<Container>`. Building it
//! never fails; without a usable live API it runs on the offline catalog.

use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::assets_cache::AssetsCache;
use crate::catalog::{ApiError, HttpMovieApi, ImageHost, MockMovieApi, MovieApi};
use crate::config::Config;
use crate::models::MovieAssets;
use crate::repository::{CatalogRepository, MovieRepository};
use crate::use_cases::UseCases;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Live,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Live => "live",
            BackendKind::Mock => "mock",
        }
    }
}

/// Outcome of choosing a data source.
pub enum Backend {
    Live(Arc<dyn MovieApi>),
    Mock { reason: String },
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Live(_) => f.write_str("Live"),
            Backend::Mock { reason } => f.debug_struct("Mock").field("reason", reason).finish(),
        }
    }
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Live(_) => BackendKind::Live,
            Backend::Mock { .. } => BackendKind::Mock,
        }
    }

    pub fn into_api(self) -> Arc<dyn MovieApi> {
        match self {
            Backend::Live(api) => api,
            Backend::Mock { .. } => Arc::new(MockMovieApi::new()),
        }
    }
}

/// Runs `construct` and falls back to the mock catalog if it fails.
pub fn select_backend<F>(construct: F) -> Backend
where
    F: FnOnce() -> Result<Arc<dyn MovieApi>>,
{
    match construct() {
        Ok(api) => Backend::Live(api),
        Err(e) => {
            warn!("Falling back to mock movie API client: {:#}", e);
            Backend::Mock {
                reason: format!("{:#}", e),
            }
        }
    }
}

pub fn build_backend(config: &Config) -> Backend {
    select_backend(|| {
        let base_url = config
            .api_base_url
            .as_deref()
            .context("MOVIE_API_BASE_URL not set")?;
        let api = HttpMovieApi::new(base_url)?;
        info!("Using live movie API at {}", api.base_url());
        Ok(Arc::new(api) as Arc<dyn MovieApi>)
    })
}

pub struct Container {
    pub repository: Arc<dyn MovieRepository>,
    pub use_cases: UseCases,
    pub assets: AssetsCache,
    backend: BackendKind,
}

impl Container {
    pub fn new(repository: Arc<dyn MovieRepository>, backend: BackendKind) -> Self {
        Self {
            use_cases: UseCases::new(repository.clone()),
            repository,
            assets: AssetsCache::new(),
            backend,
        }
    }

    pub fn from_backend(backend: Backend, images: ImageHost) -> Self {
        let kind = backend.kind();
        let repository = CatalogRepository::new(backend.into_api(), images);
        Self::new(Arc::new(repository), kind)
    }

    pub fn from_config(config: &Config) -> Self {
        let container = Self::from_backend(build_backend(config), ImageHost::new(&config.image_host));
        info!("Movie catalog backend: {}", container.backend.as_str());
        container
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend
    }

    /// Card-level asset lookup through the shared per-id cache.
    pub async fn movie_assets(&self, id: i64) -> Result<Option<MovieAssets>, ApiError> {
        self.assets.load(id, self.repository.as_ref()).await
    }
}
