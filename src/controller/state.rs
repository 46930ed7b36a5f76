//! Dashboard state shared between concurrently running tasks.
//!
//! Each field has one writer: the task that produced the value. Two tasks
//! writing the same field (e.g. two overlapping submissions) are ordered by
//! completion, so the later completion wins. Nothing is cancelled.
//! A prediction's outcome and its metrics share one slot and are replaced
//! as a pair.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::{
    BatchJob, Coordinates, DerivedMetrics, DisplayedReadings, PredictionOutcome,
};
use crate::error::EngineError;

/// User-visible failure message
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub kind: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            raised_at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: "info".into(),
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

/// Point-in-time copy of everything the dashboard shows
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub prediction_loading: bool,
    pub batch_loading: bool,
    pub last_outcome: Option<PredictionOutcome>,
    pub last_metrics: Option<DerivedMetrics>,
    pub readings: DisplayedReadings,
    pub coordinates: Option<Coordinates>,
    pub notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct DashboardState {
    predictions_in_flight: AtomicUsize,
    batches_in_flight: AtomicUsize,
    /// Outcome and the metrics derived from it, replaced together
    last_prediction: RwLock<Option<(PredictionOutcome, DerivedMetrics)>>,
    pub(crate) readings: RwLock<DisplayedReadings>,
    pub(crate) coordinates: RwLock<Option<Coordinates>>,
    pub(crate) notifications: RwLock<Vec<Notification>>,
    pub(crate) batch: RwLock<BatchJob>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prediction_loading(&self) -> bool {
        self.predictions_in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn batch_loading(&self) -> bool {
        self.batches_in_flight.load(Ordering::SeqCst) > 0
    }

    /// Mark a prediction in flight until the guard drops
    pub(crate) fn prediction_guard(&self) -> LoadingGuard<'_> {
        LoadingGuard::enter(&self.predictions_in_flight)
    }

    pub(crate) fn batch_guard(&self) -> LoadingGuard<'_> {
        LoadingGuard::enter(&self.batches_in_flight)
    }

    pub(crate) async fn notify(&self, notification: Notification) {
        self.notifications.write().await.push(notification);
    }

    pub(crate) async fn set_last_prediction(
        &self,
        outcome: PredictionOutcome,
        metrics: DerivedMetrics,
    ) {
        *self.last_prediction.write().await = Some((outcome, metrics));
    }

    pub async fn last_prediction(&self) -> Option<(PredictionOutcome, DerivedMetrics)> {
        self.last_prediction.read().await.clone()
    }

    pub async fn last_outcome(&self) -> Option<PredictionOutcome> {
        self.last_prediction.read().await.as_ref().map(|(o, _)| o.clone())
    }

    pub async fn last_metrics(&self) -> Option<DerivedMetrics> {
        self.last_prediction.read().await.as_ref().map(|(_, m)| m.clone())
    }

    pub async fn readings(&self) -> DisplayedReadings {
        *self.readings.read().await
    }

    pub async fn coordinates(&self) -> Option<Coordinates> {
        *self.coordinates.read().await
    }

    pub async fn batch(&self) -> BatchJob {
        self.batch.read().await.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }

    /// Drain pending notifications once they have been shown
    pub async fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.write().await)
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let (last_outcome, last_metrics) = match self.last_prediction().await {
            Some((outcome, metrics)) => (Some(outcome), Some(metrics)),
            None => (None, None),
        };
        DashboardSnapshot {
            prediction_loading: self.prediction_loading(),
            batch_loading: self.batch_loading(),
            last_outcome,
            last_metrics,
            readings: self.readings().await,
            coordinates: self.coordinates().await,
            notifications: self.notifications().await,
        }
    }
}

/// Holds a loading flag up; dropping it on any path releases the flag
pub(crate) struct LoadingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PLACEHOLDER_PM25;

    #[tokio::test]
    async fn test_initial_state() {
        let state = DashboardState::new();
        let snap = state.snapshot().await;
        assert!(!snap.prediction_loading);
        assert!(!snap.batch_loading);
        assert!(snap.last_outcome.is_none());
        assert_eq!(snap.readings.pm25, PLACEHOLDER_PM25);
        assert!(snap.notifications.is_empty());
    }

    #[test]
    fn test_guards_nest() {
        let state = DashboardState::new();
        let a = state.prediction_guard();
        let b = state.prediction_guard();
        drop(a);
        assert!(state.prediction_loading());
        drop(b);
        assert!(!state.prediction_loading());
        assert!(!state.batch_loading());
    }

    #[tokio::test]
    async fn test_take_notifications_drains() {
        let state = DashboardState::new();
        state
            .notify(Notification::from_error(&EngineError::Connectivity("down".into())))
            .await;
        let taken = state.take_notifications().await;
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].kind, "connectivity");
        assert!(state.notifications().await.is_empty());
    }
}
