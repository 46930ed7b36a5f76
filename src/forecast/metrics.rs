//! Derived metrics
//!
//! Loss percentage, operational status and the synthetic diurnal curve shown
//! with each prediction. Everything is deterministic except the noise draw,
//! which comes from an injected random source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::domain::{DerivedMetrics, OperationalStatus, PredictionOutcome, SeriesPoint};

/// Default reference output the loss is measured against (W/m²)
pub const REFERENCE_POWER: f64 = 800.0;
/// Relative amplitude of the uniform noise applied to each hour
pub const NOISE_AMPLITUDE: f64 = 0.05;

const SUNRISE_HOUR: u32 = 6;
const SUNSET_HOUR: u32 = 18;

/// Percentage of `reference` lost at `power`; negative when above reference
pub fn loss_percent(power: f64, reference: f64) -> f64 {
    (reference - power) / reference * 100.0
}

/// Daylight shape in `[0, 1]`: a half sine between 06:00 and 18:00, zero outside
pub fn hour_factor(hour: u32) -> f64 {
    if (SUNRISE_HOUR..=SUNSET_HOUR).contains(&hour) {
        let x = f64::from(hour - SUNRISE_HOUR) / f64::from(SUNSET_HOUR - SUNRISE_HOUR);
        (x * PI).sin().max(0.0)
    } else {
        0.0
    }
}

/// Compute metrics for `outcome`, drawing noise from `rng`
pub fn derive<R: Rng + ?Sized>(
    outcome: &PredictionOutcome,
    reference: f64,
    rng: &mut R,
) -> DerivedMetrics {
    let primary = outcome.primary.power;
    let loss = loss_percent(primary, reference);

    let series = (0..24)
        .map(|hour| {
            let noise = rng.gen_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE);
            SeriesPoint {
                hour,
                time: format!("{hour}:00"),
                power: (primary * hour_factor(hour) * (1.0 + noise)).max(0.0),
            }
        })
        .collect();

    DerivedMetrics {
        loss_percent: loss,
        status: OperationalStatus::from_loss_percent(loss),
        series,
    }
}

/// Metrics calculator owning its random source.
///
/// Seeded calculators reproduce the same series for the same outcomes.
pub struct MetricsCalculator<R = StdRng> {
    reference_power: f64,
    rng: R,
}

impl MetricsCalculator<StdRng> {
    /// `seed = None` draws entropy from the OS
    pub fn new(reference_power: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(reference_power, rng)
    }
}

impl<R: Rng> MetricsCalculator<R> {
    pub fn with_rng(reference_power: f64, rng: R) -> Self {
        Self {
            reference_power,
            rng,
        }
    }

    pub fn reference_power(&self) -> f64 {
        self.reference_power
    }

    pub fn derive(&mut self, outcome: &PredictionOutcome) -> DerivedMetrics {
        derive(outcome, self.reference_power, &mut self.rng)
    }
}

impl Default for MetricsCalculator<StdRng> {
    fn default() -> Self {
        Self::new(REFERENCE_POWER, None)
    }
}
