use thiserror::Error;

/// Failure taxonomy shared by every engine component.
///
/// `Validation` is produced locally and never reaches the network.
/// `Connectivity` and `Remote` come from outbound calls and are never retried
/// by the engine. `Geolocation` is recoverable: the caller falls back to manual
/// coordinate entry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unreachable: {0}")]
    Connectivity(String),

    #[error("Remote error: HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Geolocation unavailable: {0}")]
    Geolocation(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Stable lowercase label, used in logs and user notifications
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::Connectivity(_) => "connectivity",
            EngineError::Remote { .. } => "remote",
            EngineError::Geolocation(_) => "geolocation",
        }
    }

    /// Whether a later manual retry could plausibly succeed.
    /// Informational only; the engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Connectivity(_))
    }

    pub(crate) fn remote(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        EngineError::Remote {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EngineError::Validation(errors.to_string())
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(error: reqwest::Error) -> Self {
        // Status errors only arise from error_for_status(), which the clients
        // never call; everything else is a transport failure.
        match error.status() {
            Some(status) => EngineError::remote(status, error.to_string()),
            None => EngineError::Connectivity(error.to_string()),
        }
    }
}
