//! Client for the external NDC drug registry.

use std::time::Duration;

use crate::error::MarketError;

pub mod ndc;

pub use ndc::{NdcClient, NdcLookup, NdcProduct};

/// Builds the outbound HTTP client for registry lookups.
///
/// Deliberately a plain client: the lookup contract allows no retries and no
/// caching between calls, only the bounded per-request timeout.
pub(crate) fn registry_http_client(timeout: Duration) -> Result<reqwest::Client, MarketError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!("medcycle/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(MarketError::HttpClientInit)
}
