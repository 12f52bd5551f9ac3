use reqwest::Client;

use crate::app::error::{FetchError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::{build_client, FetcherOptions, HttpResourceFetcher};
use crate::timeout::Timeout;

/// Shared state for the command-line front end: configuration, one HTTP
/// client and the cancellation token every fetch observes.
pub struct AppContext {
    pub config: Config,
    pub client: Client,
    pub timeout: Timeout,
}

impl AppContext {
    pub fn new(config: Config, timeout: Timeout) -> Result<Self> {
        let client = build_client(&config.http)?;

        Ok(Self {
            config,
            client,
            timeout,
        })
    }

    /// Context built from the user's config file.
    pub fn load(timeout: Timeout) -> Result<Self> {
        let config = Config::load().map_err(|e| FetchError::Config(e.to_string()))?;
        Self::new(config, timeout)
    }

    /// Fetcher options seeded from the `[fetch]` and `[retry]` config sections.
    pub fn options(&self) -> FetcherOptions {
        FetcherOptions::new(self.config.fetch.show_url)
            .with_throw_on_error(self.config.fetch.throw_on_error)
            .with_retry(self.config.retry.clone())
            .with_timeout(self.timeout.clone())
    }

    pub fn fetcher(&self, url: &str, options: FetcherOptions) -> Result<HttpResourceFetcher> {
        Ok(
            HttpResourceFetcher::with_client(self.client.clone(), url, options)?
                .with_user_agent(self.config.http.user_agent()),
        )
    }
}
