use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::{endpoint, http_client, read_json};
use crate::config::ServiceConfig;
use crate::domain::{Coordinates, HealthStatus, HistoryPoint, HistoryQuery, Pm25Reading, SzaReading};
use crate::error::EngineResult;

/// Live readings and historical output exposed by the backend
#[async_trait]
pub trait ReadingsSource: Send + Sync {
    async fn sza(&self, coords: Coordinates) -> EngineResult<SzaReading>;
    async fn pm25(&self, coords: Coordinates) -> EngineResult<Pm25Reading>;
    async fn history(&self, query: &HistoryQuery) -> EngineResult<Vec<HistoryPoint>>;
    async fn health(&self) -> EngineResult<HealthStatus>;
}

#[derive(Clone)]
pub struct HttpReadingsClient {
    client: reqwest::Client,
    sza_url: String,
    pm25_url: String,
    history_url: String,
    health_url: String,
}

impl HttpReadingsClient {
    pub fn new(cfg: &ServiceConfig) -> Result<Self> {
        Ok(Self::with_client(http_client(cfg)?, cfg))
    }

    pub fn with_client(client: reqwest::Client, cfg: &ServiceConfig) -> Self {
        Self {
            client,
            sza_url: endpoint(&cfg.base_url, &cfg.sza_path),
            pm25_url: endpoint(&cfg.base_url, &cfg.pm25_path),
            history_url: endpoint(&cfg.base_url, &cfg.history_path),
            health_url: endpoint(&cfg.base_url, &cfg.health_path),
        }
    }

    async fn get_at<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        coords: Coordinates,
    ) -> EngineResult<T> {
        debug!(%url, lat = coords.latitude, lon = coords.longitude, "fetching reading");
        let resp = self
            .client
            .get(url)
            .query(&[("lat", coords.latitude), ("lon", coords.longitude)])
            .send()
            .await?;
        read_json(resp).await
    }
}

#[async_trait]
impl ReadingsSource for HttpReadingsClient {
    async fn sza(&self, coords: Coordinates) -> EngineResult<SzaReading> {
        self.get_at(&self.sza_url, coords).await
    }

    async fn pm25(&self, coords: Coordinates) -> EngineResult<Pm25Reading> {
        self.get_at(&self.pm25_url, coords).await
    }

    async fn history(&self, query: &HistoryQuery) -> EngineResult<Vec<HistoryPoint>> {
        let start = query.start_date.format("%Y-%m-%d").to_string();
        let end = query.end_date.format("%Y-%m-%d").to_string();
        let interval = query.interval.to_string();
        debug!(url = %self.history_url, %start, %end, %interval, "fetching history");

        let resp = self
            .client
            .get(&self.history_url)
            .query(&[
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("interval", interval.as_str()),
            ])
            .send()
            .await?;
        read_json(resp).await
    }

    async fn health(&self) -> EngineResult<HealthStatus> {
        let resp = self.client.get(&self.health_url).send().await?;
        read_json(resp).await
    }
}
