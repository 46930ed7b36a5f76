//! Prediction orchestration for PM2.5-aware solar output estimates.
//!
//! Raw inputs are assembled into feature records, resolved against a remote
//! inference service (or the physical fallback model), and turned into the
//! metrics shown on the dashboard. Batch files bypass that path and go
//! straight to the batch endpoint.

pub mod client;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod geolocation;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{EngineError, EngineResult};
