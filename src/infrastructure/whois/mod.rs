//! WHOIS proxy client

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::application::errors::{BotError, ConfigError, LookupError};
use crate::domain::entities::WhoisResponse;
use crate::domain::traits::WhoisLookup;


/// Client for the `/whois/{domain}` endpoint of a whoisproxy-compatible API
#[derive(Debug, Clone)]
pub struct WhoisProxyClient {
    client: Client,
    base_url: Url,
}

impl WhoisProxyClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BotError::Network(e.to_string()))?;

        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidValue(format!("whois.base-url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue(format!("whois.base-url {} cannot hold a path", base_url)).into());
        }

        Ok(Self { client, base_url })
    }

    /// `<base>/whois/<domain>`, with the domain encoded as a single path segment
    fn lookup_url(&self, domain: &str) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::Network(format!("{} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .push("whois")
            .push(domain);
        Ok(url)
    }
}

#[async_trait]
impl WhoisLookup for WhoisProxyClient {
    async fn lookup(&self, domain: &str) -> Result<WhoisResponse, LookupError> {
        let url = self.lookup_url(domain)?;
        tracing::debug!("GET {}", url);

        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        // The body carries its own status code, so the HTTP status is only logged
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("WHOIS proxy answered {} for {}", status, domain);
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| LookupError::Decode(e.to_string()))
    }
}
