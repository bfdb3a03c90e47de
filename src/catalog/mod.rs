//! Wire-level access to the movie catalog API.
//!
//! [`MovieApi`] is the seam between the repository and a data source. Two
//! sources exist: [`HttpMovieApi`] talks to the catalog service, and
//! [`MockMovieApi`] serves a fixed offline catalog. Both report a missing
//! movie as `Ok(None)` so callers cannot tell which one is active.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod http;
pub mod map;
mod mock;

pub use http::HttpMovieApi;
pub use map::{ImageHost, ImageSize};
pub use mock::MockMovieApi;

#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn fetch_featured_rails(&self) -> Result<FeaturedRailsDto, ApiError>;
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummaryDto>, ApiError>;
    /// `Ok(None)` when the catalog has no movie with this id.
    async fn fetch_movie_detail(&self, id: i64) -> Result<Option<MovieDetailDto>, ApiError>;
    /// `Ok(None)` when the catalog has no assets for this id.
    async fn fetch_movie_assets(&self, id: i64) -> Result<Option<MovieAssetsDto>, ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to fetch {path} ({status})")]
    Status { path: String, status: u16 },
    #[error("Request for {path} failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to decode response for {path}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn path(&self) -> &str {
        match self {
            ApiError::Status { path, .. }
            | ApiError::Transport { path, .. }
            | ApiError::Decode { path, .. } => path,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummaryDto {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetailDto {
    #[serde(flatten)]
    pub summary: MovieSummaryDto,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieAssetsDto {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub textless_backdrop_path: Option<String>,
    #[serde(default)]
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeroDto {
    pub detail: MovieDetailDto,
    #[serde(default)]
    pub assets: Option<MovieAssetsDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeaturedRailsDto {
    #[serde(default)]
    pub hero: Option<HeroDto>,
    #[serde(default)]
    pub trending: Vec<MovieSummaryDto>,
    #[serde(default)]
    pub top: Vec<MovieSummaryDto>,
    #[serde(default)]
    pub now: Vec<MovieSummaryDto>,
}
