use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::{endpoint, http_client};
use crate::config::ServiceConfig;
use crate::domain::{BatchArtifact, BatchFile};
use crate::error::{EngineError, EngineResult};

/// Transport for tabular batch predictions
#[async_trait]
pub trait BatchSubmitter: Send + Sync {
    async fn submit_batch(&self, file: &BatchFile) -> EngineResult<BatchArtifact>;
}

/// Uploads a file as `multipart/form-data` (field `file`) and returns the
/// response body as an opaque artifact named `predictions_<original>`.
#[derive(Clone)]
pub struct HttpBatchClient {
    client: reqwest::Client,
    url: String,
}

impl HttpBatchClient {
    pub fn new(cfg: &ServiceConfig) -> Result<Self> {
        Ok(Self::with_client(http_client(cfg)?, cfg))
    }

    pub fn with_client(client: reqwest::Client, cfg: &ServiceConfig) -> Self {
        Self {
            client,
            url: endpoint(&cfg.base_url, &cfg.batch_path),
        }
    }
}

#[async_trait]
impl BatchSubmitter for HttpBatchClient {
    async fn submit_batch(&self, file: &BatchFile) -> EngineResult<BatchArtifact> {
        debug!(url = %self.url, filename = %file.filename, bytes = file.bytes.len(), "uploading batch");

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let resp = self.client.post(&self.url).multipart(form).send().await?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = resp.text().await?;
            return Err(EngineError::remote(status, body));
        }

        let bytes = resp.bytes().await?;
        Ok(BatchArtifact {
            filename: file.result_filename(),
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn upload() -> BatchFile {
        BatchFile::new("june.csv", b"pm25,hour\n42.7,12\n".to_vec())
    }

    fn client_for(base_url: &str) -> HttpBatchClient {
        HttpBatchClient::new(&ServiceConfig::with_base_url(base_url)).unwrap()
    }

    #[tokio::test]
    async fn test_batch_success_names_artifact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/predict/batch"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"pm25,hour,predicted_power\n42.7,12,512.4\n".to_vec(), "text/csv"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let artifact = client_for(&server.uri()).submit_batch(&upload()).await.unwrap();
        assert_eq!(artifact.filename, "predictions_june.csv");
        assert_eq!(artifact.content_type.as_deref(), Some("text/csv"));
        assert!(artifact.bytes.ends_with(b"512.4\n"));
    }

    #[tokio::test]
    async fn test_batch_failure_surfaces_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("missing column: pm25"))
            .mount(&server)
            .await;

        let err = client_for(&server.uri()).submit_batch(&upload()).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::Remote {
                status: 422,
                body: "missing column: pm25".into()
            }
        );
    }

    #[tokio::test]
    async fn test_batch_unreachable() {
        let base_url = crate::test_support::unreachable_base_url();
        let err = client_for(&base_url).submit_batch(&upload()).await.unwrap_err();
        assert!(matches!(err, EngineError::Connectivity(_)));
    }
}
