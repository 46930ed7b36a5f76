use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;

use crate::domain::Coordinates;
use crate::forecast::{FallbackPolicy, ScenarioOrdering, REFERENCE_POWER};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

/// Prediction backend endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub predict_path: String,
    pub batch_path: String,
    pub sza_path: String,
    pub pm25_path: String,
    pub history_path: String,
    pub health_path: String,
    /// Unset keeps the transport's own default
    pub http_timeout_seconds: Option<u64>,
}

impl ServiceConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            predict_path: "/api/predict".into(),
            batch_path: "/api/predict/batch".into(),
            sza_path: "/api/readings/sza".into(),
            pm25_path: "/api/readings/pm25".into(),
            history_path: "/api/analytics/history".into(),
            health_path: "/api/health".into(),
            http_timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub reference_power: f64,
    pub fallback_policy: FallbackPolicy,
    pub scenario_ordering: ScenarioOrdering,
    /// Fixed seed for the series noise; unset draws from OS entropy
    pub noise_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_power: REFERENCE_POWER,
            fallback_policy: FallbackPolicy::default(),
            scenario_ordering: ScenarioOrdering::default(),
            noise_seed: None,
        }
    }
}

/// Coordinates reported by the fixed geolocation provider
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationConfig {
    /// Both halves must be set to count as a location
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.latitude?, self.longitude?))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("PVP__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        if !(cfg.engine.reference_power.is_finite() && cfg.engine.reference_power > 0.0) {
            anyhow::bail!(
                "engine.reference_power must be a positive number, got {}",
                cfg.engine.reference_power
            );
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let cfg = Config::from_figment(Figment::new()).unwrap();
        assert_eq!(cfg.service.predict_path, "/api/predict");
        assert_eq!(cfg.service.http_timeout_seconds, None);
        assert_eq!(cfg.engine.reference_power, 800.0);
        assert_eq!(cfg.engine.fallback_policy, FallbackPolicy::SurfaceError);
        assert_eq!(cfg.engine.scenario_ordering, ScenarioOrdering::Sequential);
        assert!(cfg.location.coordinates().is_none());
    }

    #[test]
    fn test_toml_overrides() {
        let toml = r#"
            [service]
            base_url = "http://inference.local:9000"
            http_timeout_seconds = 15

            [engine]
            fallback_policy = "fallback_on_failure"
            scenario_ordering = "concurrent"
            noise_seed = 7

            [location]
            latitude = 40.7128
            longitude = -74.006
        "#;
        let cfg = Config::from_figment(Figment::new().merge(Toml::string(toml))).unwrap();
        assert_eq!(cfg.service.base_url, "http://inference.local:9000");
        assert_eq!(cfg.service.health_path, "/api/health");
        assert_eq!(cfg.service.http_timeout_seconds, Some(15));
        assert_eq!(cfg.engine.fallback_policy, FallbackPolicy::FallbackOnFailure);
        assert_eq!(cfg.engine.scenario_ordering, ScenarioOrdering::Concurrent);
        assert_eq!(cfg.engine.noise_seed, Some(7));
        assert_eq!(
            cfg.location.coordinates(),
            Some(Coordinates::new(40.7128, -74.006))
        );
    }

    #[test]
    fn test_rejects_non_positive_reference() {
        let toml = "[engine]\nreference_power = 0.0\n";
        assert!(Config::from_figment(Figment::new().merge(Toml::string(toml))).is_err());
    }

    #[test]
    fn test_half_location_is_none() {
        let loc = LocationConfig {
            latitude: Some(10.0),
            longitude: None,
        };
        assert!(loc.coordinates().is_none());
    }
}
