pub mod state;

pub use state::{DashboardSnapshot, DashboardState, Notification};

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::{
    http_client, BatchSubmitter, HttpBatchClient, HttpInferenceClient, HttpReadingsClient,
    PowerPredictor, ReadingsSource,
};
use crate::config::{Config, EngineConfig};
use crate::domain::{
    BatchArtifact, BatchFile, ComparisonMode, Coordinates, DerivedMetrics, HealthStatus,
    HistoryPoint, HistoryView, PredictionMode, PredictionOutcome,
};
use crate::error::{EngineError, EngineResult};
use crate::forecast::{
    assemble, estimate_outcome, FallbackPolicy, MetricsCalculator, RawInputs, ScenarioCoordinator,
};
use crate::geolocation::{FixedLocation, GeolocationProvider};

/// What a submission produced
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitResult {
    Prediction {
        outcome: PredictionOutcome,
        metrics: DerivedMetrics,
    },
    Batch {
        filename: String,
        content_type: Option<String>,
        size: usize,
    },
}

/// Interactive prediction session: wires the pipeline to the dashboard state.
///
/// Every terminal failure is pushed to the notification list and releases its
/// loading flag before the error is returned.
#[derive(Clone)]
pub struct PredictionSession {
    coordinator: ScenarioCoordinator,
    batch: Arc<dyn BatchSubmitter>,
    readings: Arc<dyn ReadingsSource>,
    locator: Arc<dyn GeolocationProvider>,
    policy: FallbackPolicy,
    metrics: Arc<Mutex<MetricsCalculator>>,
    state: Arc<DashboardState>,
}

impl PredictionSession {
    /// Session talking to the configured backend over HTTP
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = http_client(&cfg.service)?;
        Ok(Self::new(
            Arc::new(HttpInferenceClient::with_client(client.clone(), &cfg.service)),
            Arc::new(HttpBatchClient::with_client(client.clone(), &cfg.service)),
            Arc::new(HttpReadingsClient::with_client(client, &cfg.service)),
            Arc::new(FixedLocation::from(&cfg.location)),
            &cfg.engine,
        ))
    }

    pub fn new(
        predictor: Arc<dyn PowerPredictor>,
        batch: Arc<dyn BatchSubmitter>,
        readings: Arc<dyn ReadingsSource>,
        locator: Arc<dyn GeolocationProvider>,
        engine: &EngineConfig,
    ) -> Self {
        Self {
            coordinator: ScenarioCoordinator::new(predictor, engine.scenario_ordering),
            batch,
            readings,
            locator,
            policy: engine.fallback_policy,
            metrics: Arc::new(Mutex::new(MetricsCalculator::new(
                engine.reference_power,
                engine.noise_seed,
            ))),
            state: Arc::new(DashboardState::new()),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Handle the submit action.
    ///
    /// A selected batch file takes over the action entirely; otherwise the
    /// inputs are assembled and predicted.
    pub async fn submit(
        &self,
        inputs: &RawInputs,
        mode: PredictionMode,
        comparison: ComparisonMode,
    ) -> EngineResult<SubmitResult> {
        let span = info_span!("submission", request_id = %Uuid::new_v4());
        async {
            if self.state.batch.read().await.has_file() {
                let artifact = self.submit_batch().await?;
                return Ok(SubmitResult::Batch {
                    size: artifact.bytes.len(),
                    filename: artifact.filename,
                    content_type: artifact.content_type,
                });
            }
            let (outcome, metrics) = self.predict(inputs, mode, comparison).await?;
            Ok(SubmitResult::Prediction { outcome, metrics })
        }
        .instrument(span)
        .await
    }

    /// Assemble, resolve and derive metrics for one request.
    ///
    /// Refused while a batch upload is in flight.
    pub async fn predict(
        &self,
        inputs: &RawInputs,
        mode: PredictionMode,
        comparison: ComparisonMode,
    ) -> EngineResult<(PredictionOutcome, DerivedMetrics)> {
        if self.state.batch.read().await.is_submitting() {
            return Err(self
                .fail(EngineError::Validation(
                    "prediction is disabled while a batch submission is in progress".into(),
                ))
                .await);
        }

        let request = match assemble(inputs, mode, comparison) {
            Ok(request) => request,
            Err(e) => return Err(self.fail(e).await),
        };

        let _loading = self.state.prediction_guard();
        let resolved = if self.policy.uses_remote() {
            match self.coordinator.resolve(&request).await {
                Ok(outcome) => Ok(outcome),
                Err(e) => self.policy.recover(&request, e),
            }
        } else {
            Ok(estimate_outcome(&request))
        };
        let outcome = match resolved {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e).await),
        };

        let metrics = self.metrics.lock().await.derive(&outcome);
        info!(
            loss_percent = metrics.loss_percent,
            status = %metrics.status,
            remote = outcome.is_fully_remote(),
            "prediction complete"
        );

        self.state
            .set_last_prediction(outcome.clone(), metrics.clone())
            .await;
        Ok((outcome, metrics))
    }

    pub async fn select_batch_file(&self, file: BatchFile) -> EngineResult<()> {
        let selected = self.state.batch.write().await.select(file);
        match selected {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e).await),
        }
    }

    pub async fn remove_batch_file(&self) -> EngineResult<()> {
        let removed = self.state.batch.write().await.remove();
        match removed {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Upload the selected file and store the returned artifact
    pub async fn submit_batch(&self) -> EngineResult<BatchArtifact> {
        let begun = self.state.batch.write().await.begin_submit();
        let file = match begun {
            Ok(file) => file,
            Err(e) => return Err(self.fail(e).await),
        };

        let _loading = self.state.batch_guard();
        info!(filename = %file.filename, bytes = file.bytes.len(), "submitting batch");
        match self.batch.submit_batch(&file).await {
            Ok(artifact) => {
                info!(artifact = %artifact.filename, bytes = artifact.bytes.len(), "batch complete");
                self.state.batch.write().await.complete(artifact.clone());
                Ok(artifact)
            }
            Err(e) => {
                self.state.batch.write().await.fail(e.clone());
                Err(self.fail(e).await)
            }
        }
    }

    /// Ask for the current position and, if known, refresh both readings.
    ///
    /// A geolocation failure is not an error: placeholders stay displayed
    /// and `None` is returned so the caller can ask for manual coordinates.
    pub async fn locate_and_load_readings(&self) -> Option<Coordinates> {
        let coords = match self.locator.locate().await {
            Ok(coords) => coords,
            Err(e) => {
                warn!(error = %e, "geolocation unavailable, keeping placeholder readings");
                self.state.notify(Notification::from_error(&e)).await;
                return None;
            }
        };
        self.set_coordinates(coords).await;
        let _ = tokio::join!(self.reload_sza(), self.reload_pm25());
        Some(coords)
    }

    /// Manually entered coordinates replace any located ones
    pub async fn set_coordinates(&self, coords: Coordinates) {
        *self.state.coordinates.write().await = Some(coords);
    }

    /// Refresh the solar zenith reading for the current coordinates
    pub async fn reload_sza(&self) -> EngineResult<f64> {
        let coords = self.current_coordinates().await?;
        match self.readings.sza(coords).await {
            Ok(reading) => {
                self.state.readings.write().await.sza = reading.sza;
                Ok(reading.sza)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Refresh the PM2.5 reading. A station-less answer keeps the old value.
    pub async fn reload_pm25(&self) -> EngineResult<Option<f64>> {
        let coords = self.current_coordinates().await?;
        let reading = match self.readings.pm25(coords).await {
            Ok(reading) => reading,
            Err(e) => return Err(self.fail(e).await),
        };
        match reading.pm25 {
            Some(pm25) => self.state.readings.write().await.pm25 = pm25,
            None => {
                let message = reading
                    .message
                    .unwrap_or_else(|| "no PM2.5 reading near this location".into());
                self.state.notify(Notification::info(message)).await;
            }
        }
        Ok(reading.pm25)
    }

    pub async fn history(
        &self,
        view: HistoryView,
        year: i32,
        month: u32,
        day: u32,
    ) -> EngineResult<Vec<HistoryPoint>> {
        let query = match view.query(year, month, day) {
            Ok(query) => query,
            Err(e) => return Err(self.fail(e).await),
        };
        match self.readings.history(&query).await {
            Ok(points) => Ok(points),
            Err(e) => Err(self.fail(e).await),
        }
    }

    pub async fn health(&self) -> EngineResult<HealthStatus> {
        match self.readings.health().await {
            Ok(status) => Ok(status),
            Err(e) => Err(self.fail(e).await),
        }
    }

    async fn current_coordinates(&self) -> EngineResult<Coordinates> {
        match self.state.coordinates().await {
            Some(coords) => Ok(coords),
            None => Err(self
                .fail(EngineError::Validation(
                    "coordinates are required to load readings".into(),
                ))
                .await),
        }
    }

    async fn fail(&self, err: EngineError) -> EngineError {
        error!(kind = err.kind(), error = %err, "request failed");
        self.state.notify(Notification::from_error(&err)).await;
        err
    }
}
