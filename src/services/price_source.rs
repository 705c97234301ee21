//! Price aggregation endpoint client
//!
//! [`PriceSource`] is the seam between the comparison logic and the remote
//! aggregation service. [`HttpPriceSource`] POSTs the [`RideLinks`] body and
//! decodes the returned price matrix.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::config::Config;
use crate::services::links::RideLinks;
use crate::types::{RawPriceMatrix, RideCompareError, Result};

/// Default user agent for endpoint requests
pub const DEFAULT_USER_AGENT: &str = concat!("ridecompare/", env!("CARGO_PKG_VERSION"));

/// Source of raw price matrices
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch quotes for the route encoded in `links`.
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies are all
    /// reported as [`RideCompareError::UpstreamFetch`].
    async fn fetch(&self, links: &RideLinks) -> Result<RawPriceMatrix>;
}

/// HTTP client for the price aggregation endpoint
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpPriceSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| RideCompareError::Config(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error) -> RideCompareError {
        if error.is_timeout() {
            return RideCompareError::upstream(format!(
                "request to {} timed out after {}s",
                self.endpoint,
                self.timeout.as_secs()
            ));
        }
        RideCompareError::UpstreamFetch {
            status: error.status().map(|s| s.as_u16()),
            message: format!("HTTP request failed: {}", error),
        }
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch(&self, links: &RideLinks) -> Result<RawPriceMatrix> {
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(links)
            .send()
            .await
            .map_err(|e| self.convert_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RideCompareError::UpstreamFetch {
                status: Some(status.as_u16()),
                message: format!("HTTP error! status: {}", status),
            });
        }

        let mut body = response
            .bytes()
            .await
            .map_err(|e| self.convert_reqwest_error(&e))?
            .to_vec();

        RawPriceMatrix::from_json_slice(&mut body)
            .map_err(|e| RideCompareError::upstream(format!("invalid response format: {}", e)))
    }
}
