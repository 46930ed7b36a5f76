use async_trait::async_trait;

use crate::config::LocationConfig;
use crate::domain::Coordinates;
use crate::error::{EngineError, EngineResult};

/// Best-effort source of the user's position.
///
/// Failure is recoverable: callers keep placeholder readings and wait for
/// coordinates to be entered by hand.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn locate(&self) -> EngineResult<Coordinates>;
}

/// Provider answering with configured coordinates, if any
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(Option<Coordinates>);

impl FixedLocation {
    pub fn new(coords: Option<Coordinates>) -> Self {
        Self(coords)
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl From<&LocationConfig> for FixedLocation {
    fn from(cfg: &LocationConfig) -> Self {
        Self(cfg.coordinates())
    }
}

#[async_trait]
impl GeolocationProvider for FixedLocation {
    async fn locate(&self) -> EngineResult<Coordinates> {
        self.0
            .ok_or_else(|| EngineError::Geolocation("no location configured".into()))
    }
}
