use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::wire::{PredictPayload, PredictResponse};
use super::{endpoint, http_client, read_json};
use crate::config::ServiceConfig;
use crate::domain::FeatureRecord;
use crate::error::EngineResult;

/// Source of power predictions for a single feature record.
///
/// Implementations make exactly one attempt per call and return failures
/// as-is; choosing a fallback is the caller's business.
#[async_trait]
pub trait PowerPredictor: Send + Sync {
    async fn predict(&self, record: &FeatureRecord) -> EngineResult<f64>;
}

/// Remote inference service client
#[derive(Clone)]
pub struct HttpInferenceClient {
    client: reqwest::Client,
    url: String,
}

impl HttpInferenceClient {
    pub fn new(cfg: &ServiceConfig) -> Result<Self> {
        Ok(Self::with_client(http_client(cfg)?, cfg))
    }

    pub fn with_client(client: reqwest::Client, cfg: &ServiceConfig) -> Self {
        Self {
            client,
            url: endpoint(&cfg.base_url, &cfg.predict_path),
        }
    }
}

#[async_trait]
impl PowerPredictor for HttpInferenceClient {
    async fn predict(&self, record: &FeatureRecord) -> EngineResult<f64> {
        let payload = PredictPayload::from(record);
        debug!(url = %self.url, mode = %record.mode(), pm25 = record.pm25, "requesting prediction");

        let resp = self.client.post(&self.url).json(&payload).send().await?;
        let body: PredictResponse = read_json(resp).await?;
        Ok(body.predicted_power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Conditions, Coordinates};
    use crate::error::EngineError;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record() -> FeatureRecord {
        FeatureRecord {
            pm25: 42.7,
            pm25_lag1: 38.5,
            ac_power_lag1: 420.0,
            power_factor_lag1: 0.95,
            hour: 12,
            month: 6,
            conditions: Conditions::Location(Coordinates::new(40.7128, -74.006)),
        }
    }

    fn client_for(base_url: &str) -> HttpInferenceClient {
        HttpInferenceClient::new(&ServiceConfig::with_base_url(base_url)).unwrap()
    }

    #[tokio::test]
    async fn test_predict_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/predict"))
            .and(body_partial_json(json!({
                "is_location_mode": true,
                "pm25_lag1": 38.5,
                "ac_power_lag1": 420.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"predicted_power": 512.4})))
            .expect(1)
            .mount(&server)
            .await;

        let power = client_for(&server.uri()).predict(&record()).await.unwrap();
        assert_eq!(power, 512.4);
    }

    #[tokio::test]
    async fn test_non_success_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/predict"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"detail":"Latitude and Longitude required for Location Mode"}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).predict(&record()).await.unwrap_err();
        match err {
            EngineError::Remote { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("Latitude and Longitude required"));
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).predict(&record()).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::Remote {
                status: 200,
                body: "not json".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_is_connectivity_error() {
        let base_url = crate::test_support::unreachable_base_url();
        let err = client_for(&base_url).predict(&record()).await.unwrap_err();
        assert!(matches!(err, EngineError::Connectivity(_)), "got {err:?}");
    }
}
