use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A movie as it appears on a rail card.
///
/// `poster_path` and `backdrop_path` hold fully resolved image URLs once the
/// summary has gone through mapping.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    /// 0 means "no score", not a zero rating.
    pub vote_average: f64,
}

impl MovieSummary {
    pub fn has_score(&self) -> bool {
        self.vote_average > 0.0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetail {
    #[serde(flatten)]
    pub summary: MovieSummary,
    pub overview: String,
    pub release_date: Option<String>,
    pub genres: Vec<String>,
}

impl MovieDetail {
    /// Year of an ISO `release_date`, if present and well formed.
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| d.year())
    }
}

impl Deref for MovieDetail {
    type Target = MovieSummary;

    fn deref(&self) -> &MovieSummary {
        &self.summary
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieAssets {
    pub id: i64,
    pub title: String,
    pub backdrop_url: Option<String>,
    pub textless_backdrop_url: Option<String>,
    pub logo_url: Option<String>,
    pub preview_video_url: Option<String>,
}

impl MovieAssets {
    /// Backdrop preferred by the hero banner: textless first, then the regular one.
    pub fn hero_background(&self) -> Option<&str> {
        self.textless_backdrop_url
            .as_deref()
            .or(self.backdrop_url.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Hero {
    pub detail: MovieDetail,
    pub assets: Option<MovieAssets>,
}

/// One curated snapshot of the home screen. A movie may show up on several rails.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct FeaturedRails {
    pub hero: Option<Hero>,
    pub trending: Vec<MovieSummary>,
    pub top: Vec<MovieSummary>,
    pub now: Vec<MovieSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(release_date: Option<&str>) -> MovieDetail {
        MovieDetail {
            summary: MovieSummary {
                id: 1,
                title: "Demo".to_string(),
                poster_path: None,
                backdrop_path: None,
                vote_average: 0.0,
            },
            overview: String::new(),
            release_date: release_date.map(str::to_string),
            genres: vec![],
        }
    }

    #[test]
    fn zero_vote_average_means_unscored() {
        let d = detail(None);
        assert!(!d.has_score());
        assert_eq!(d.title, "Demo");
    }

    #[test]
    fn release_year_requires_iso_date() {
        assert_eq!(detail(Some("2024-10-01")).release_year(), Some(2024));
        assert_eq!(detail(Some("October 2024")).release_year(), None);
        assert_eq!(detail(None).release_year(), None);
    }

    #[test]
    fn detail_serializes_flat() {
        let value = serde_json::to_value(detail(Some("2024-01-01"))).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["voteAverage"], 0.0);
        assert_eq!(value["releaseDate"], "2024-01-01");
    }
}
