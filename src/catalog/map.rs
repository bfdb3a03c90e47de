use super::{FeaturedRailsDto, HeroDto, MovieAssetsDto, MovieDetailDto, MovieSummaryDto};
use crate::models::{FeaturedRails, Hero, MovieAssets, MovieDetail, MovieSummary};

pub const DEFAULT_IMAGE_HOST: &str = "https://image.tmdb.org/t/p";

/// Size bucket requested from the image host for each kind of picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Poster,
    Backdrop,
    TextlessBackdrop,
    Logo,
}

impl ImageSize {
    pub fn token(&self) -> &'static str {
        match self {
            ImageSize::Poster => "w500",
            ImageSize::Backdrop => "w1280",
            ImageSize::TextlessBackdrop => "original",
            ImageSize::Logo => "w500",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHost {
    base: String,
}

impl ImageHost {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        build_image_url(&self.base, path, size.token())
    }
}

impl Default for ImageHost {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_HOST)
    }
}

/// `"{host}/{size}{path}"`, or `None` when there is no path.
pub fn build_image_url(host: &str, path: Option<&str>, size: &str) -> Option<String> {
    path.map(|p| format!("{host}/{size}{p}"))
}

pub fn map_summary(dto: MovieSummaryDto, images: &ImageHost) -> MovieSummary {
    MovieSummary {
        id: dto.id,
        title: dto.title,
        poster_path: images.url(dto.poster_path.as_deref(), ImageSize::Poster),
        backdrop_path: images.url(dto.backdrop_path.as_deref(), ImageSize::Backdrop),
        vote_average: dto.vote_average.unwrap_or(0.0),
    }
}

pub fn map_detail(dto: MovieDetailDto, images: &ImageHost) -> MovieDetail {
    MovieDetail {
        summary: map_summary(dto.summary, images),
        overview: dto.overview,
        release_date: dto.release_date,
        genres: dto.genres,
    }
}

pub fn map_assets(dto: MovieAssetsDto, images: &ImageHost) -> MovieAssets {
    MovieAssets {
        id: dto.id,
        title: dto.title,
        backdrop_url: images.url(dto.backdrop_path.as_deref(), ImageSize::Backdrop),
        textless_backdrop_url: images.url(
            dto.textless_backdrop_path.as_deref(),
            ImageSize::TextlessBackdrop,
        ),
        logo_url: images.url(dto.logo_path.as_deref(), ImageSize::Logo),
        preview_video_url: None,
    }
}

fn map_hero(dto: HeroDto, images: &ImageHost) -> Hero {
    Hero {
        detail: map_detail(dto.detail, images),
        assets: dto.assets.map(|a| map_assets(a, images)),
    }
}

pub fn map_featured_rails(dto: FeaturedRailsDto, images: &ImageHost) -> FeaturedRails {
    let rail = |items: Vec<MovieSummaryDto>| {
        items
            .into_iter()
            .map(|s| map_summary(s, images))
            .collect::<Vec<_>>()
    };
    FeaturedRails {
        hero: dto.hero.map(|h| map_hero(h, images)),
        trending: rail(dto.trending),
        top: rail(dto.top),
        now: rail(dto.now),
    }
}
