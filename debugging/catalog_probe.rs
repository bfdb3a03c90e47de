//! Run one catalog operation through the container and print the mapped result.
//! Usage:
//!   cargo run --bin catalog_probe -- featured
//!   cargo run --bin catalog_probe -- search <query>
//!   cargo run --bin catalog_probe -- movie <id>
//!   cargo run --bin catalog_probe -- assets <id>
//! Reads MOVIE_API_BASE_URL from the environment (.env supported); without it
//! the offline catalog answers.

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use marquee::config::Config;
use marquee::container::Container;
use serde_json::{json, Value};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operation {
    Featured,
    Search,
    Movie,
    Assets,
}

impl FromStr for Operation {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "featured" => Ok(Operation::Featured),
            "search" => Ok(Operation::Search),
            "movie" => Ok(Operation::Movie),
            "assets" => Ok(Operation::Assets),
            _ => Err(anyhow!(
                "operation must be one of 'featured', 'search', 'movie', 'assets'"
            )),
        }
    }
}

fn parse_id(arg: Option<String>) -> Result<i64> {
    arg.context("missing movie id")?
        .parse()
        .context("movie id must be an integer")
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let mut args = env::args().skip(1);
    let op: Operation = args
        .next()
        .context("usage: catalog_probe <featured|search|movie|assets> [arg]")?
        .parse()?;

    let config = Config::from_env()?;
    let container = Container::from_config(&config);
    let use_cases = &container.use_cases;

    let output: Value = match op {
        Operation::Featured => serde_json::to_value(use_cases.get_featured_rails.execute().await?)?,
        Operation::Search => {
            let query = args.collect::<Vec<_>>().join(" ");
            serde_json::to_value(use_cases.search_movies.execute(&query).await?)?
        }
        Operation::Movie => {
            let id = parse_id(args.next())?;
            serde_json::to_value(use_cases.get_movie_detail.execute(id).await?)?
        }
        Operation::Assets => {
            let id = parse_id(args.next())?;
            serde_json::to_value(container.movie_assets(id).await?)?
        }
    };

    let report = json!({
        "backend": container.backend_kind().as_str(),
        "result": output,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
