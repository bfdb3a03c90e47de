//! Data layer for the marquee movie storefront.
//!
//! Catalog DTOs are fetched from the live API or the offline mock, mapped into
//! view models, and served through use cases and a small query cache.

pub mod app;
pub mod assets_cache;
pub mod catalog;
pub mod config;
pub mod container;
pub mod models;
pub mod query;
pub mod repository;
pub mod use_cases;
