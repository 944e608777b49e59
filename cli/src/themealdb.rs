use anyhow::{Context, Result};
use reqwest::Url;

use mealcache_core::service::MealDbProvider;

pub struct TheMealDbClient {
    client: reqwest::Client,
    base_url: String,
    rt: tokio::runtime::Handle,
}

impl TheMealDbClient {
    /// Must be created inside a tokio runtime.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "mealcache/{} (recipe cache)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            rt: tokio::runtime::Handle::current(),
        })
    }

    pub fn url(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<Url> {
        let raw = format!("{}{endpoint}", self.base_url);
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        url.with_context(|| format!("Invalid TheMealDB URL: {raw}"))
    }

    pub async fn fetch_async(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<String> {
        let url = self.url(endpoint, params)?;
        tracing::debug!(%url, "requesting TheMealDB");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach TheMealDB API")?
            .error_for_status()
            .context("TheMealDB API returned an error status")?;

        resp.text()
            .await
            .context("Failed to read TheMealDB response body")
    }
}

impl MealDbProvider for TheMealDbClient {
    fn fetch(&self, endpoint: &str, params: &[(&'static str, String)]) -> Result<String> {
        self.rt.block_on(self.fetch_async(endpoint, params))
    }
}
