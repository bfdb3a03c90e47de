//! Product-level operations. Each one delegates to a single repository call.
use std::sync::Arc;

use crate::catalog::ApiError;
use crate::models::{FeaturedRails, MovieDetail, MovieSummary};
use crate::repository::MovieRepository;

#[derive(Clone)]
pub struct GetFeaturedRailsUseCase {
    repository: Arc<dyn MovieRepository>,
}

impl GetFeaturedRailsUseCase {
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self) -> Result<FeaturedRails, ApiError> {
        self.repository.get_featured_rails().await
    }
}

#[derive(Clone)]
pub struct GetMovieDetailUseCase {
    repository: Arc<dyn MovieRepository>,
}

impl GetMovieDetailUseCase {
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, id: i64) -> Result<Option<MovieDetail>, ApiError> {
        self.repository.get_movie_by_id(id).await
    }
}

#[derive(Clone)]
pub struct SearchMoviesUseCase {
    repository: Arc<dyn MovieRepository>,
}

impl SearchMoviesUseCase {
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, query: &str) -> Result<Vec<MovieSummary>, ApiError> {
        self.repository.search_movies(query).await
    }
}

#[derive(Clone)]
pub struct UseCases {
    pub get_featured_rails: GetFeaturedRailsUseCase,
    pub search_movies: SearchMoviesUseCase,
    pub get_movie_detail: GetMovieDetailUseCase,
}

impl UseCases {
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self {
            get_featured_rails: GetFeaturedRailsUseCase::new(repository.clone()),
            search_movies: SearchMoviesUseCase::new(repository.clone()),
            get_movie_detail: GetMovieDetailUseCase::new(repository),
        }
    }
}
