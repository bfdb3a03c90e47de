use std::env;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crate::catalog::map::DEFAULT_IMAGE_HOST;

pub const DEFAULT_FEATURED_STALE_SECS: u64 = 60;
pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3146));

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a whole number of seconds, got '{value}'")]
    InvalidSeconds { key: &'static str, value: String },
    #[error("{key} must be a socket address like 0.0.0.0:3146, got '{value}'")]
    InvalidAddr { key: &'static str, value: String },
}

/// Process configuration, read once at start-up.
///
/// A missing `MOVIE_API_BASE_URL` is not an error here: it makes live client
/// construction fail later, which switches the container to the mock catalog.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub image_host: String,
    pub featured_stale: Duration,
    pub listen_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            image_host: DEFAULT_IMAGE_HOST.to_string(),
            featured_stale: Duration::from_secs(DEFAULT_FEATURED_STALE_SECS),
            listen_addr: DEFAULT_LISTEN_ADDR,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let featured_stale = match get("FEATURED_STALE_SECS") {
            Some(v) => Duration::from_secs(v.parse().map_err(|_| ConfigError::InvalidSeconds {
                key: "FEATURED_STALE_SECS",
                value: v.clone(),
            })?),
            None => Duration::from_secs(DEFAULT_FEATURED_STALE_SECS),
        };

        let listen_addr = match get("STOREFRONT_ADDR") {
            Some(v) => v.parse::<SocketAddr>().map_err(|_| ConfigError::InvalidAddr {
                key: "STOREFRONT_ADDR",
                value: v.clone(),
            })?,
            None => DEFAULT_LISTEN_ADDR,
        };

        Ok(Self {
            api_base_url: get("MOVIE_API_BASE_URL"),
            image_host: get("MOVIE_IMAGE_HOST").unwrap_or_else(|| DEFAULT_IMAGE_HOST.to_string()),
            featured_stale,
            listen_addr,
        })
    }
}
