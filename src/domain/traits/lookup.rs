use async_trait::async_trait;
use crate::domain::entities::WhoisResponse;
use crate::application::errors::LookupError;

/// WhoisLookup trait - abstraction over the registration-data provider
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    /// Look up an ASCII-compatible domain name
    async fn lookup(&self, domain: &str) -> Result<WhoisResponse, LookupError>;
}
