//! Upstream account API client with rate limiting and retries.
//!
//! Account lookups go to the region's vortex host, nickname searches to
//! the public API host. Requests are throttled by a token bucket and
//! transient failures (connection errors, HTTP 429, HTTP 5xx) are retried
//! with exponential backoff until the retry budget runs out.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::models::{AccountData, AccountId, AccountListing, Config, Region, RetryConfig};
use crate::domain::ports::{AccountFetcher, FetchError};

use super::models::{AccountResponse, SearchResponse};

/// Per-request timeout when none is configured.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors building an upstream client.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("Invalid region: {0}. Must be one of: EU, NA, CIS, RU, ASIA")]
    InvalidRegion(String),

    #[error("Invalid rate limit: {0} requests/s with burst {1}")]
    InvalidRateLimit(f64, u32),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Settings for [`VortexClient`].
#[derive(Debug, Clone)]
pub struct VortexClientConfig {
    pub vortex_base_url: String,
    pub api_base_url: String,
    pub application_id: String,
    pub request_timeout: Duration,
    pub requests_per_second: f64,
    pub burst_size: u32,
    pub retry: RetryConfig,
}

impl Default for VortexClientConfig {
    fn default() -> Self {
        Self::for_region(Region::Eu)
    }
}

impl VortexClientConfig {
    /// Defaults pointing at the region's public hosts.
    pub fn for_region(region: Region) -> Self {
        Self {
            vortex_base_url: region.vortex_base_url(),
            api_base_url: region.api_base_url(),
            application_id: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            requests_per_second: 10.0,
            burst_size: 20,
            retry: RetryConfig::default(),
        }
    }

    /// Build from the application config, applying host overrides.
    pub fn from_config(config: &Config) -> Result<Self, ClientBuildError> {
        let upstream = &config.upstream;
        let region = Region::from_config_str(&upstream.region)
            .ok_or_else(|| ClientBuildError::InvalidRegion(upstream.region.clone()))?;
        let defaults = Self::for_region(region);

        Ok(Self {
            vortex_base_url: upstream.vortex_base_url.clone().unwrap_or(defaults.vortex_base_url),
            api_base_url: upstream.api_base_url.clone().unwrap_or(defaults.api_base_url),
            application_id: upstream.application_id.clone(),
            request_timeout: config.sync.fetch_timeout(),
            requests_per_second: config.rate_limit.requests_per_second,
            burst_size: config.rate_limit.burst_size,
            retry: config.retry.clone(),
        })
    }
}

/// HTTP implementation of [`AccountFetcher`].
pub struct VortexClient {
    http: Client,
    config: VortexClientConfig,
    limiter: DefaultDirectRateLimiter,
}

impl VortexClient {
    pub fn new(config: VortexClientConfig) -> Result<Self, ClientBuildError> {
        let invalid = || ClientBuildError::InvalidRateLimit(config.requests_per_second, config.burst_size);

        if !(config.requests_per_second.is_finite() && config.requests_per_second > 0.0) {
            return Err(invalid());
        }
        let burst = NonZeroU32::new(config.burst_size).ok_or_else(invalid)?;
        let quota = Quota::with_period(Duration::from_secs_f64(1.0 / config.requests_per_second))
            .ok_or_else(invalid)?
            .allow_burst(burst);

        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("karma-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            limiter: RateLimiter::direct(quota),
            config,
        })
    }

    fn backoff(&self) -> backoff::ExponentialBackoff {
        let retry = &self.config.retry;
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(retry.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(retry.max_backoff_ms))
            .with_max_elapsed_time(Some(Duration::from_millis(retry.max_elapsed_ms)))
            .build()
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Returns `Ok(None)` on HTTP 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, FetchError> {
        let operation = || async move {
            self.limiter.until_ready().await;

            let response = self
                .http
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(classify_transport_error(&e)))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                tracing::debug!(url, %status, "transient upstream status, retrying");
                return Err(backoff::Error::transient(FetchError::Unavailable(format!("HTTP {status}"))));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(FetchError::Unavailable(format!("HTTP {status}"))));
            }

            response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| backoff::Error::permanent(FetchError::InvalidPayload(e.to_string())))
        };

        backoff::future::retry(self.backoff(), operation).await
    }
}

fn classify_transport_error(err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl AccountFetcher for VortexClient {
    #[tracing::instrument(skip(self), fields(account_id = id))]
    async fn fetch(&self, id: AccountId) -> Result<AccountData, FetchError> {
        let url = format!("{}/api/accounts/{id}/", self.config.vortex_base_url.trim_end_matches('/'));

        self.get_json::<AccountResponse>(&url, &[])
            .await?
            .ok_or(FetchError::NotFound(id))?
            .into_account_data(id)
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<AccountListing>, FetchError> {
        let url = format!("{}/wows/account/list/", self.config.api_base_url.trim_end_matches('/'));
        let params = [
            ("application_id", self.config.application_id.as_str()),
            ("search", query),
        ];

        match self.get_json::<SearchResponse>(&url, &params).await? {
            Some(response) => response.into_listings(),
            None => Ok(Vec::new()),
        }
    }
}
