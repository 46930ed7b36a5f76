//! Prediction pipeline: assemble features, resolve scenarios, estimate
//! offline and derive display metrics.

pub mod assembler;
pub mod coordinator;
pub mod fallback;
pub mod metrics;

pub use assembler::*;
pub use coordinator::*;
pub use fallback::{estimate, pm25_impact_curve, MAX_POWER};
pub use metrics::*;
