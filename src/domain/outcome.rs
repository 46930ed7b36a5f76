use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Where a power value came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PowerSource {
    /// The remote inference service
    Remote,
    /// The closed-form physical approximation
    Fallback,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PowerValue {
    /// Predicted AC power (W/m²)
    pub power: f64,
    pub source: PowerSource,
}

impl PowerValue {
    pub fn remote(power: f64) -> Self {
        Self {
            power,
            source: PowerSource::Remote,
        }
    }

    pub fn fallback(power: f64) -> Self {
        Self {
            power,
            source: PowerSource::Fallback,
        }
    }
}

/// Result of one submitted request. Never mutated; the next request
/// produces a fresh outcome that replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionOutcome {
    pub primary: PowerValue,
    /// Scenario 2 value, present only in penalty mode
    pub secondary: Option<PowerValue>,
    pub captured_at: DateTime<Utc>,
}

impl PredictionOutcome {
    pub fn new(primary: PowerValue, secondary: Option<PowerValue>) -> Self {
        Self {
            primary,
            secondary,
            captured_at: Utc::now(),
        }
    }

    /// Absolute power gap between the two pollutant scenarios
    pub fn difference(&self) -> Option<f64> {
        self.secondary
            .map(|second| (self.primary.power - second.power).abs())
    }

    /// Total farm output in kW for a panel area in m², per scenario
    pub fn farm_output_kw(&self, area_m2: f64) -> Option<FarmOutput> {
        if !(area_m2.is_finite() && area_m2 > 0.0) {
            return None;
        }
        Some(FarmOutput {
            area_m2,
            primary_kw: self.primary.power * area_m2 / 1000.0,
            secondary_kw: self.secondary.map(|v| v.power * area_m2 / 1000.0),
        })
    }

    pub fn is_fully_remote(&self) -> bool {
        self.primary.source == PowerSource::Remote
            && self
                .secondary
                .map_or(true, |v| v.source == PowerSource::Remote)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FarmOutput {
    pub area_m2: f64,
    pub primary_kw: f64,
    pub secondary_kw: Option<f64>,
}

/// Coarse degradation tier derived from the loss percentage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationalStatus {
    Optimal,
    Degraded,
    Severe,
}

impl OperationalStatus {
    /// severe > 50% loss, degraded > 25%, optimal otherwise
    pub fn from_loss_percent(loss_percent: f64) -> Self {
        if loss_percent > 50.0 {
            Self::Severe
        } else if loss_percent > 25.0 {
            Self::Degraded
        } else {
            Self::Optimal
        }
    }
}

/// One hour of the synthetic diurnal curve
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub hour: u32,
    /// Display label, e.g. `"13:00"`
    pub time: String,
    pub power: f64,
}

/// Secondary metrics shown next to a prediction.
///
/// `series` is an illustrative daylight-shaped curve scaled to the primary
/// prediction with random noise. It is synthetic and not a forecast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedMetrics {
    pub loss_percent: f64,
    pub status: OperationalStatus,
    pub series: Vec<SeriesPoint>,
}

/// A point on the PM2.5 decay curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ImpactPoint {
    pub pm25: f64,
    pub power: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_only_in_penalty_mode() {
        let single = PredictionOutcome::new(PowerValue::remote(450.0), None);
        assert_eq!(single.difference(), None);

        let penalty =
            PredictionOutcome::new(PowerValue::remote(450.0), Some(PowerValue::remote(500.0)));
        assert_eq!(penalty.difference(), Some(50.0));
    }

    #[test]
    fn test_farm_output() {
        let outcome =
            PredictionOutcome::new(PowerValue::remote(400.0), Some(PowerValue::remote(300.0)));
        let farm = outcome.farm_output_kw(2500.0).unwrap();
        assert_eq!(farm.primary_kw, 1000.0);
        assert_eq!(farm.secondary_kw, Some(750.0));

        assert!(outcome.farm_output_kw(0.0).is_none());
        assert!(outcome.farm_output_kw(-3.0).is_none());
        assert!(outcome.farm_output_kw(f64::NAN).is_none());
    }

    #[test]
    fn test_sources() {
        let mixed =
            PredictionOutcome::new(PowerValue::remote(1.0), Some(PowerValue::fallback(2.0)));
        assert!(!mixed.is_fully_remote());
        assert!(PredictionOutcome::new(PowerValue::remote(1.0), None).is_fully_remote());
        assert_eq!(PowerSource::Fallback.to_string(), "fallback");
    }

    #[test]
    fn test_status_tiers() {
        assert_eq!(OperationalStatus::from_loss_percent(25.0), OperationalStatus::Optimal);
        assert_eq!(OperationalStatus::from_loss_percent(25.01), OperationalStatus::Degraded);
        assert_eq!(OperationalStatus::from_loss_percent(50.0), OperationalStatus::Degraded);
        assert_eq!(OperationalStatus::from_loss_percent(50.01), OperationalStatus::Severe);
        assert_eq!(OperationalStatus::from_loss_percent(-10.0), OperationalStatus::Optimal);
    }
}
