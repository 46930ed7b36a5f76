use serde::Deserialize;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use super::fallback;
use crate::client::PowerPredictor;
use crate::domain::{FeatureRecord, PowerValue, PredictionOutcome, Scenario, ScenarioRequest};
use crate::error::{EngineError, EngineResult};

/// How the two penalty-mode calls are scheduled
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScenarioOrdering {
    /// Scenario 2 starts only after scenario 1 has resolved successfully
    #[default]
    Sequential,
    /// Both calls in flight together; the first failure wins.
    ///
    /// Scenario 2 is sent before scenario 1 resolves, so a failing first
    /// call no longer prevents the second request from reaching the
    /// service. Only the all-or-nothing outcome is kept.
    Concurrent,
}

/// What to do when the remote service cannot produce a value
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FallbackPolicy {
    /// Surface the failure; no value is shown
    #[default]
    SurfaceError,
    /// Replace a failed request with physical estimates for every scenario
    FallbackOnFailure,
    /// Never call the remote service
    AlwaysFallback,
}

impl FallbackPolicy {
    pub fn uses_remote(self) -> bool {
        !matches!(self, FallbackPolicy::AlwaysFallback)
    }

    /// Turn a failed remote resolution into the policy's answer.
    ///
    /// Validation errors are never masked; they mean the request itself is bad.
    pub fn recover(
        self,
        request: &ScenarioRequest,
        error: EngineError,
    ) -> EngineResult<PredictionOutcome> {
        match (self, &error) {
            (_, EngineError::Validation(_)) | (FallbackPolicy::SurfaceError, _) => Err(error),
            _ => {
                warn!(kind = error.kind(), %error, "remote prediction failed, using physical estimate");
                Ok(estimate_outcome(request))
            }
        }
    }
}

/// Outcome built entirely from the physical model
pub fn estimate_outcome(request: &ScenarioRequest) -> PredictionOutcome {
    PredictionOutcome::new(
        PowerValue::fallback(fallback::estimate(request.primary())),
        request
            .comparison()
            .map(|record| PowerValue::fallback(fallback::estimate(record))),
    )
}

/// Issues one inference call per scenario and merges the answers.
///
/// A request either resolves completely or fails as a whole; partial values
/// from a penalty request are dropped.
#[derive(Clone)]
pub struct ScenarioCoordinator {
    predictor: Arc<dyn PowerPredictor>,
    ordering: ScenarioOrdering,
}

impl ScenarioCoordinator {
    pub fn new(predictor: Arc<dyn PowerPredictor>, ordering: ScenarioOrdering) -> Self {
        Self {
            predictor,
            ordering,
        }
    }

    pub fn ordering(&self) -> ScenarioOrdering {
        self.ordering
    }

    pub async fn resolve(&self, request: &ScenarioRequest) -> EngineResult<PredictionOutcome> {
        let primary = request.primary();
        let outcome = match request.comparison() {
            None => {
                let power = self.call(Scenario::One, primary).await?;
                PredictionOutcome::new(PowerValue::remote(power), None)
            }
            Some(second) => {
                let (p1, p2) = match self.ordering {
                    ScenarioOrdering::Sequential => {
                        let p1 = self.call(Scenario::One, primary).await?;
                        let p2 = self.call(Scenario::Two, second).await?;
                        (p1, p2)
                    }
                    ScenarioOrdering::Concurrent => tokio::try_join!(
                        self.call(Scenario::One, primary),
                        self.call(Scenario::Two, second),
                    )?,
                };
                PredictionOutcome::new(PowerValue::remote(p1), Some(PowerValue::remote(p2)))
            }
        };

        info!(
            mode = %request.comparison_mode(),
            primary = outcome.primary.power,
            secondary = outcome.secondary.map(|v| v.power),
            "prediction resolved"
        );
        Ok(outcome)
    }

    async fn call(&self, scenario: Scenario, record: &FeatureRecord) -> EngineResult<f64> {
        debug!(%scenario, pm25 = record.pm25, "calling inference");
        self.predictor.predict(record).await.map_err(|e| {
            warn!(%scenario, kind = e.kind(), error = %e, "inference call failed");
            e
        })
    }
}
