//! Feature assembly
//!
//! Turns raw form state into validated [`FeatureRecord`]s. Everything here is
//! local: a failure blocks submission and never reaches the network.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{
    Atmosphere, ComparisonMode, Conditions, Coordinates, FeatureRecord, PredictionMode,
    ScenarioRequest,
};
use crate::error::{EngineError, EngineResult};

pub const DEFAULT_PM25_LAG1: f64 = 0.0;
pub const DEFAULT_AC_POWER_LAG1: f64 = 0.0;
pub const DEFAULT_POWER_FACTOR_LAG1: f64 = 0.95;
pub const DEFAULT_HOUR: u32 = 12;
pub const DEFAULT_MONTH: u32 = 6;

/// Raw scalar state as entered by the user.
///
/// Optional lag fields fall back to documented defaults; manual-mode
/// atmospheric fields and location-mode coordinates are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RawInputs {
    #[validate(range(min = 0.0, max = 500.0))]
    pub pm25: f64,
    /// Scenario 2 concentration, read only in penalty mode
    #[validate(range(min = 0.0, max = 500.0))]
    pub pm25_scenario_two: Option<f64>,
    #[validate(range(min = 0.0, max = 500.0))]
    pub pm25_lag1: Option<f64>,
    #[validate(range(min = 0.0, max = 800.0))]
    pub ac_power_lag1: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub power_factor_lag1: Option<f64>,
    #[validate(range(min = 8, max = 16))]
    pub hour: Option<u32>,
    #[validate(range(min = 1, max = 12))]
    pub month: Option<u32>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[validate(range(min = 0.0, max = 1200.0))]
    pub surface_irradiance: Option<f64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub clearness_index: Option<f64>,
    #[validate(range(min = -20.0, max = 50.0))]
    pub temperature_c: Option<f64>,
    #[validate(range(min = -20.0, max = 50.0))]
    pub temperature_lag1_c: Option<f64>,
    #[validate(range(min = 0.0, max = 90.0))]
    pub solar_zenith_deg: Option<f64>,
    #[validate(range(min = 0.0, max = 20.0))]
    pub wind_speed_ms: Option<f64>,
}

// Range checks let NaN through, so finiteness is checked separately.
fn ensure_finite(inputs: &RawInputs) -> EngineResult<()> {
    let fields = [
        ("pm25", Some(inputs.pm25)),
        ("pm25_scenario_two", inputs.pm25_scenario_two),
        ("pm25_lag1", inputs.pm25_lag1),
        ("ac_power_lag1", inputs.ac_power_lag1),
        ("power_factor_lag1", inputs.power_factor_lag1),
        ("latitude", inputs.latitude),
        ("longitude", inputs.longitude),
        ("surface_irradiance", inputs.surface_irradiance),
        ("clearness_index", inputs.clearness_index),
        ("temperature_c", inputs.temperature_c),
        ("temperature_lag1_c", inputs.temperature_lag1_c),
        ("solar_zenith_deg", inputs.solar_zenith_deg),
        ("wind_speed_ms", inputs.wind_speed_ms),
    ];
    match fields
        .iter()
        .find(|(_, v)| v.is_some_and(|v| !v.is_finite()))
    {
        Some((name, _)) => Err(EngineError::Validation(format!("{name} must be a finite number"))),
        None => Ok(()),
    }
}

/// Validate `inputs` and build the request for the chosen modes
pub fn assemble(
    inputs: &RawInputs,
    mode: PredictionMode,
    comparison: ComparisonMode,
) -> EngineResult<ScenarioRequest> {
    ensure_finite(inputs)?;
    inputs.validate()?;

    let conditions = match mode {
        PredictionMode::Location => Conditions::Location(coordinates(inputs)?),
        PredictionMode::Manual => Conditions::Manual(atmosphere(inputs)?),
    };

    let record = FeatureRecord {
        pm25: inputs.pm25,
        pm25_lag1: inputs.pm25_lag1.unwrap_or(DEFAULT_PM25_LAG1),
        ac_power_lag1: inputs.ac_power_lag1.unwrap_or(DEFAULT_AC_POWER_LAG1),
        power_factor_lag1: inputs.power_factor_lag1.unwrap_or(DEFAULT_POWER_FACTOR_LAG1),
        hour: inputs.hour.unwrap_or(DEFAULT_HOUR),
        month: inputs.month.unwrap_or(DEFAULT_MONTH),
        conditions,
    };

    match comparison {
        ComparisonMode::Single => Ok(ScenarioRequest::single(record)),
        ComparisonMode::Penalty => {
            let second = inputs.pm25_scenario_two.ok_or_else(|| {
                EngineError::Validation("penalty mode requires a scenario 2 PM2.5 value".into())
            })?;
            Ok(ScenarioRequest::penalty(record, second))
        }
    }
}

fn coordinates(inputs: &RawInputs) -> EngineResult<Coordinates> {
    match (inputs.latitude, inputs.longitude) {
        (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
        _ => Err(EngineError::Validation(
            "latitude and longitude are required in location mode".into(),
        )),
    }
}

fn atmosphere(inputs: &RawInputs) -> EngineResult<Atmosphere> {
    let required = |value: Option<f64>, name: &str| {
        value.ok_or_else(|| EngineError::Validation(format!("{name} is required in manual mode")))
    };

    let temperature_c = required(inputs.temperature_c, "temperature_c")?;
    Ok(Atmosphere {
        surface_irradiance: required(inputs.surface_irradiance, "surface_irradiance")?,
        clearness_index: required(inputs.clearness_index, "clearness_index")?,
        temperature_c,
        temperature_lag1_c: inputs.temperature_lag1_c.unwrap_or(temperature_c),
        solar_zenith_deg: required(inputs.solar_zenith_deg, "solar_zenith_deg")?,
        wind_speed_ms: required(inputs.wind_speed_ms, "wind_speed_ms")?,
    })
}
