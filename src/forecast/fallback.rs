//! Physical fallback model
//!
//! Closed-form approximation of AC output per square metre, used when the
//! inference service is unavailable or not trusted. It keeps the dashboard
//! usable offline; it does not reproduce the trained model's accuracy.

use crate::domain::{Conditions, FeatureRecord, ImpactPoint};

/// Upper bound of the estimate and nominal clear-sky output (W/m²)
pub const MAX_POWER: f64 = 800.0;
/// Irradiance the manual-mode formula is normalised against (W/m²)
pub const REFERENCE_IRRADIANCE: f64 = 800.0;
/// e-folding concentration of the PM2.5 attenuation term (µg/m³)
pub const PM25_DECAY_SCALE: f64 = 100.0;

const IMPACT_CURVE_PEAK: f64 = 700.0;
const IMPACT_CURVE_MAX_PM25: u32 = 150;
const IMPACT_CURVE_STEP: usize = 5;

/// Estimate AC power for a record, always within `[0, MAX_POWER]`.
///
/// * location mode: `800 · e^(−pm25/100)`
/// * manual mode: `800 · cos(sza) · kt · e^(−pm25/100) · (1 − |T−25|/100)
///   · daytime · (G/800) · pf`, with `daytime = 1` for hours 8-16, else 0.5
pub fn estimate(record: &FeatureRecord) -> f64 {
    let attenuation = pm25_attenuation(record.pm25);

    let raw = match &record.conditions {
        Conditions::Location(_) => MAX_POWER * attenuation,
        Conditions::Manual(a) => {
            let zenith = a.solar_zenith_deg.to_radians().cos();
            let temperature = 1.0 - (a.temperature_c - 25.0).abs() / 100.0;
            let daytime = if (8..=16).contains(&record.hour) { 1.0 } else { 0.5 };
            let irradiance = a.surface_irradiance / REFERENCE_IRRADIANCE;

            MAX_POWER
                * zenith
                * a.clearness_index
                * attenuation
                * temperature
                * daytime
                * irradiance
                * record.power_factor_lag1
        }
    };

    clamp_power(raw)
}

fn pm25_attenuation(pm25: f64) -> f64 {
    (-pm25 / PM25_DECAY_SCALE).exp()
}

fn clamp_power(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, MAX_POWER)
}

/// Illustrative decay of output with PM2.5, 0 to 150 µg/m³ in steps of 5
pub fn pm25_impact_curve() -> Vec<ImpactPoint> {
    (0..=IMPACT_CURVE_MAX_PM25)
        .step_by(IMPACT_CURVE_STEP)
        .map(|pm25| {
            let pm25 = f64::from(pm25);
            let power = IMPACT_CURVE_PEAK * pm25_attenuation(pm25);
            ImpactPoint {
                pm25,
                power: (power * 10.0).round() / 10.0,
            }
        })
        .collect()
}
