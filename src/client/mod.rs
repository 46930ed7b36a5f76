//! Outbound HTTP adapters for the prediction backend.
//!
//! All clients share one `reqwest::Client` and the same response handling:
//! a non-2xx status becomes [`EngineError::Remote`] carrying the body, a
//! transport failure becomes [`EngineError::Connectivity`]. Nothing here
//! retries.

pub mod batch;
pub mod inference;
pub mod readings;
pub mod wire;

pub use batch::*;
pub use inference::*;
pub use readings::*;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::{EngineError, EngineResult};

/// Build the shared HTTP client. Without a configured timeout the
/// transport default applies.
pub fn http_client(cfg: &ServiceConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("pv-pollution-predictor/", env!("CARGO_PKG_VERSION"))),
    );
    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(secs) = cfg.http_timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Read the body and decode it as JSON, classifying failures
pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> EngineResult<T> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(EngineError::remote(status, body));
    }
    serde_json::from_str(&body).map_err(|_| EngineError::remote(status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        assert_eq!(
            endpoint("http://localhost:8000/", "/api/predict"),
            "http://localhost:8000/api/predict"
        );
        assert_eq!(
            endpoint("http://localhost:8000", "api/health"),
            "http://localhost:8000/api/health"
        );
    }
}
