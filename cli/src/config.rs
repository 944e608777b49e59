use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use mealcache_core::themealdb::BASE_URL;

pub struct Config {
    pub db_path: PathBuf,
    pub api_base_url: String,
}

impl Config {
    /// Database under the platform data dir unless `MEALCACHE_DB` is set;
    /// upstream base URL from `MEALCACHE_API_URL`, defaulting to TheMealDB.
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "mealcache").context("Could not determine home directory")?;

        let db_path = match std::env::var_os("MEALCACHE_DB") {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => {
                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir).with_context(|| {
                    format!("Failed to create data directory: {}", data_dir.display())
                })?;
                data_dir.join("mealcache.db")
            }
        };

        let api_base_url = std::env::var("MEALCACHE_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map_or_else(|| BASE_URL.to_string(), |url| normalize_base_url(&url));

        Ok(Config {
            db_path,
            api_base_url,
        })
    }
}

/// Endpoints are appended directly, so the base must end in `/`.
pub(crate) fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
