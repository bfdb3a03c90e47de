use async_trait::async_trait;
use std::sync::Arc;

use crate::catalog::map::{map_assets, map_detail, map_featured_rails, map_summary};
use crate::catalog::{ApiError, ImageHost, MovieApi};
use crate::models::{FeaturedRails, MovieAssets, MovieDetail, MovieSummary};

/// Domain-facing catalog contract the use cases depend on.
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn get_featured_rails(&self) -> Result<FeaturedRails, ApiError>;
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummary>, ApiError>;
    async fn get_movie_by_id(&self, id: i64) -> Result<Option<MovieDetail>, ApiError>;
    async fn get_movie_assets(&self, id: i64) -> Result<Option<MovieAssets>, ApiError>;
}

/// Composes a [`MovieApi`] with DTO mapping. Errors pass through untouched.
#[derive(Clone)]
pub struct CatalogRepository {
    api: Arc<dyn MovieApi>,
    images: ImageHost,
}

impl CatalogRepository {
    pub fn new(api: Arc<dyn MovieApi>, images: ImageHost) -> Self {
        Self { api, images }
    }
}

#[async_trait]
impl MovieRepository for CatalogRepository {
    async fn get_featured_rails(&self) -> Result<FeaturedRails, ApiError> {
        let dto = self.api.fetch_featured_rails().await?;
        Ok(map_featured_rails(dto, &self.images))
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummary>, ApiError> {
        let dtos = self.api.search_movies(query).await?;
        Ok(dtos
            .into_iter()
            .map(|d| map_summary(d, &self.images))
            .collect())
    }

    async fn get_movie_by_id(&self, id: i64) -> Result<Option<MovieDetail>, ApiError> {
        let dto = self.api.fetch_movie_detail(id).await?;
        Ok(dto.map(|d| map_detail(d, &self.images)))
    }

    async fn get_movie_assets(&self, id: i64) -> Result<Option<MovieAssets>, ApiError> {
        let dto = self.api.fetch_movie_assets(id).await?;
        Ok(dto.map(|d| map_assets(d, &self.images)))
    }
}
