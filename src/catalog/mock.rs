//! Offline catalog used when the live API client cannot be constructed.
use async_trait::async_trait;

use super::{
    ApiError, FeaturedRailsDto, HeroDto, MovieApi, MovieAssetsDto, MovieDetailDto,
    MovieSummaryDto,
};

#[derive(Debug, Clone)]
pub struct MockMovieApi {
    summaries: Vec<MovieSummaryDto>,
}

impl MockMovieApi {
    pub fn new() -> Self {
        Self {
            summaries: demo_summaries(),
        }
    }

    fn find(&self, id: i64) -> Option<&MovieSummaryDto> {
        self.summaries.iter().find(|s| s.id == id)
    }

    fn hero(&self) -> Option<HeroDto> {
        let first = self.summaries.first()?.clone();
        let assets = assets_for(&first);
        Some(HeroDto {
            detail: MovieDetailDto {
                summary: first,
                overview: "A mock hero movie synopsis used while offline.".to_string(),
                release_date: Some("2024-10-01".to_string()),
                genres: vec!["Drama".to_string()],
            },
            assets: Some(assets),
        })
    }
}

impl Default for MockMovieApi {
    fn default() -> Self {
        Self::new()
    }
}

fn demo_summaries() -> Vec<MovieSummaryDto> {
    [
        (1, "Demo Movie", 7.5),
        (2, "Sample Adventure", 8.3),
        (3, "Thriller Nights", 6.8),
    ]
    .into_iter()
    .map(|(id, title, vote)| MovieSummaryDto {
        id,
        title: title.to_string(),
        poster_path: None,
        backdrop_path: None,
        vote_average: Some(vote),
    })
    .collect()
}

fn assets_for(summary: &MovieSummaryDto) -> MovieAssetsDto {
    MovieAssetsDto {
        id: summary.id,
        title: summary.title.clone(),
        backdrop_path: summary.backdrop_path.clone(),
        textless_backdrop_path: summary.backdrop_path.clone(),
        logo_path: summary.poster_path.clone(),
    }
}

#[async_trait]
impl MovieApi for MockMovieApi {
    async fn fetch_featured_rails(&self) -> Result<FeaturedRailsDto, ApiError> {
        let mut top = self.summaries.clone();
        top.reverse();
        Ok(FeaturedRailsDto {
            hero: self.hero(),
            trending: self.summaries.clone(),
            top,
            now: self.summaries.iter().take(2).cloned().collect(),
        })
    }

    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummaryDto>, ApiError> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .summaries
            .iter()
            .filter(|s| needle.is_empty() || s.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn fetch_movie_detail(&self, id: i64) -> Result<Option<MovieDetailDto>, ApiError> {
        Ok(self.find(id).map(|s| MovieDetailDto {
            summary: s.clone(),
            overview: "This is placeholder content used while wiring the API client.".to_string(),
            release_date: Some("2024-01-01".to_string()),
            genres: vec!["Drama".to_string()],
        }))
    }

    async fn fetch_movie_assets(&self, id: i64) -> Result<Option<MovieAssetsDto>, ApiError> {
        Ok(self.find(id).map(assets_for))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let api = MockMovieApi::new();
        assert!(api.fetch_movie_detail(999).await.unwrap().is_none());
        assert!(api.fetch_movie_assets(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn known_id_returns_matching_detail() {
        let api = MockMovieApi::new();
        let detail = api.fetch_movie_detail(1).await.unwrap().expect("id 1 exists");
        assert_eq!(detail.summary.id, 1);
        let assets = api.fetch_movie_assets(1).await.unwrap().expect("id 1 exists");
        assert_eq!(assets.title, detail.summary.title);
    }

    #[tokio::test]
    async fn featured_rails_have_hero_and_rails() {
        let rails = MockMovieApi::new().fetch_featured_rails().await.unwrap();
        let hero = rails.hero.expect("mock hero");
        assert_eq!(hero.detail.summary.id, 1);
        assert_eq!(hero.assets.map(|a| a.id), Some(1));
        let ids = |r: &[MovieSummaryDto]| r.iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(ids(&rails.trending), vec![1, 2, 3]);
        assert_eq!(ids(&rails.top), vec![3, 2, 1]);
        assert_eq!(ids(&rails.now), vec![1, 2]);
    }

    #[tokio::test]
    async fn search_filters_by_title() {
        let api = MockMovieApi::new();
        let hits = api.search_movies("thriller").await.unwrap();
        assert_eq!(hits.iter().map(|m| m.id).collect::<Vec<_>>(), vec![3]);
        assert_eq!(api.search_movies("").await.unwrap().len(), 3);
        assert!(api.search_movies("nothing like this").await.unwrap().is_empty());
    }
}
