use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{ApiError, FeaturedRailsDto, MovieApi, MovieAssetsDto, MovieDetailDto, MovieSummaryDto};

#[derive(Debug, Clone)]
pub struct HttpMovieApi {
    client: Client,
    base_url: String,
}

impl HttpMovieApi {
    /// Fails when `base_url` is missing a scheme/host or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .with_context(|| format!("Invalid movie API base URL '{}'", base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(anyhow!(
                "Movie API base URL must be an http(s) URL with a host, got '{}'",
                base_url
            ));
        }

        let user_agent = format!("marquee/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build movie API HTTP client")?;

        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        self.client
            .get(&url)
            .header(header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })
    }

    async fn read_json<T: DeserializeOwned>(
        path: &str,
        res: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        let text = res.text().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let res = self.get(path).await?;
        Self::read_json(path, res).await
    }

    /// Like `get_json`, but a 404 is "not found" rather than a failure.
    async fn get_json_maybe<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let res = self.get(path).await?;
        if res.status() == StatusCode::NOT_FOUND {
            debug!(path, "not found");
            return Ok(None);
        }
        Self::read_json(path, res).await.map(Some)
    }
}

#[async_trait]
impl MovieApi for HttpMovieApi {
    async fn fetch_featured_rails(&self) -> Result<FeaturedRailsDto, ApiError> {
        self.get_json("/movies/featured").await
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummaryDto>, ApiError> {
        let path = format!("/movies/search?q={}", urlencoding::encode(query));
        self.get_json(&path).await
    }

    async fn fetch_movie_detail(&self, id: i64) -> Result<Option<MovieDetailDto>, ApiError> {
        self.get_json_maybe(&format!("/movies/{id}")).await
    }

    async fn fetch_movie_assets(&self, id: i64) -> Result<Option<MovieAssetsDto>, ApiError> {
        self.get_json_maybe(&format!("/movies/{id}/assets")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let api = HttpMovieApi::new("http://localhost:3001/api/").expect("valid url");
        assert_eq!(api.base_url(), "http://localhost:3001/api");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(HttpMovieApi::new("").is_err());
        assert!(HttpMovieApi::new("localhost:3001").is_err());
        assert!(HttpMovieApi::new("ftp://catalog.example").is_err());
    }
}
