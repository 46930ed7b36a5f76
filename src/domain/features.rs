use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the atmospheric part of a feature record is obtained
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PredictionMode {
    /// Coordinates only; the service resolves sensor readings itself
    Location,
    /// Every atmospheric variable entered by hand
    Manual,
}

/// Whether one or two pollutant scenarios are evaluated per request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComparisonMode {
    #[default]
    Single,
    Penalty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Manually supplied atmospheric conditions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Atmosphere {
    /// All-sky surface shortwave downward irradiance (W/m²)
    pub surface_irradiance: f64,
    /// All-sky clearness index (0-1)
    pub clearness_index: f64,
    /// Temperature at 2 m (°C)
    pub temperature_c: f64,
    /// Temperature at 2 m one hour earlier (°C)
    pub temperature_lag1_c: f64,
    /// Solar zenith angle (degrees, 0-90)
    pub solar_zenith_deg: f64,
    /// Wind speed at 10 m (m/s)
    pub wind_speed_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Conditions {
    Location(Coordinates),
    Manual(Atmosphere),
}

/// Validated feature vector for one inference call.
///
/// Built by the feature assembler; every field is finite and inside its
/// declared bound. Power values are per square metre of panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureRecord {
    /// PM2.5 concentration (µg/m³)
    pub pm25: f64,
    /// PM2.5 concentration one hour earlier (µg/m³)
    pub pm25_lag1: f64,
    /// AC power one hour earlier (W/m²)
    pub ac_power_lag1: f64,
    /// Power factor one hour earlier (0-1)
    pub power_factor_lag1: f64,
    /// Hour of day (8-16)
    pub hour: u32,
    /// Month (1-12)
    pub month: u32,
    pub conditions: Conditions,
}

impl FeatureRecord {
    pub fn mode(&self) -> PredictionMode {
        match self.conditions {
            Conditions::Location(_) => PredictionMode::Location,
            Conditions::Manual(_) => PredictionMode::Manual,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match self.conditions {
            Conditions::Location(c) => Some(c),
            Conditions::Manual(_) => None,
        }
    }

    pub fn atmosphere(&self) -> Option<&Atmosphere> {
        match &self.conditions {
            Conditions::Location(_) => None,
            Conditions::Manual(a) => Some(a),
        }
    }

    /// Same conditions with a different pollutant concentration
    pub fn with_pm25(&self, pm25: f64) -> Self {
        Self { pm25, ..*self }
    }
}

/// Tag of a comparison scenario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
pub enum Scenario {
    #[strum(serialize = "scenario 1")]
    One,
    #[strum(serialize = "scenario 2")]
    Two,
}

/// One or two records to resolve in a single request.
///
/// In penalty mode the second record differs from the first only in `pm25`;
/// the constructors are the only way to build one, so that always holds.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScenarioRequest {
    primary: FeatureRecord,
    comparison: Option<FeatureRecord>,
}

impl ScenarioRequest {
    pub fn single(record: FeatureRecord) -> Self {
        Self {
            primary: record,
            comparison: None,
        }
    }

    pub fn penalty(record: FeatureRecord, scenario_two_pm25: f64) -> Self {
        Self {
            primary: record,
            comparison: Some(record.with_pm25(scenario_two_pm25)),
        }
    }

    pub fn comparison_mode(&self) -> ComparisonMode {
        if self.comparison.is_some() {
            ComparisonMode::Penalty
        } else {
            ComparisonMode::Single
        }
    }

    pub fn primary(&self) -> &FeatureRecord {
        &self.primary
    }

    pub fn comparison(&self) -> Option<&FeatureRecord> {
        self.comparison.as_ref()
    }

    /// Records in resolution order
    pub fn scenarios(&self) -> Vec<(Scenario, &FeatureRecord)> {
        let mut out = vec![(Scenario::One, &self.primary)];
        if let Some(second) = &self.comparison {
            out.push((Scenario::Two, second));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_record() -> FeatureRecord {
        FeatureRecord {
            pm25: 42.7,
            pm25_lag1: 38.5,
            ac_power_lag1: 0.0,
            power_factor_lag1: 0.95,
            hour: 12,
            month: 6,
            conditions: Conditions::Manual(Atmosphere {
                surface_irradiance: 800.0,
                clearness_index: 0.65,
                temperature_c: 25.0,
                temperature_lag1_c: 25.0,
                solar_zenith_deg: 32.4,
                wind_speed_ms: 3.5,
            }),
        }
    }

    #[test]
    fn test_penalty_request_differs_only_in_pm25() {
        let request = ScenarioRequest::penalty(manual_record(), 60.0);
        let second = request.comparison().unwrap();

        assert_eq!(request.comparison_mode(), ComparisonMode::Penalty);
        assert_eq!(second.pm25, 60.0);
        assert_eq!(second.with_pm25(42.7), *request.primary());
    }

    #[test]
    fn test_scenario_order_and_labels() {
        let request = ScenarioRequest::penalty(manual_record(), 60.0);
        let tags: Vec<String> = request
            .scenarios()
            .iter()
            .map(|(s, _)| s.to_string())
            .collect();
        assert_eq!(tags, vec!["scenario 1", "scenario 2"]);

        let single = ScenarioRequest::single(manual_record());
        assert_eq!(single.scenarios().len(), 1);
        assert_eq!(single.comparison_mode(), ComparisonMode::Single);
    }

    #[test]
    fn test_mode_follows_conditions() {
        let manual = manual_record();
        assert_eq!(manual.mode(), PredictionMode::Manual);
        assert!(manual.coordinates().is_none());

        let located = FeatureRecord {
            conditions: Conditions::Location(Coordinates::new(40.7128, -74.006)),
            ..manual
        };
        assert_eq!(located.mode(), PredictionMode::Location);
        assert!(located.atmosphere().is_none());
        assert_eq!(located.mode().to_string(), "location");
    }
}
