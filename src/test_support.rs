use async_trait::async_trait;
use std::net::TcpListener;
use std::sync::Mutex;
use std::time::Duration;

use crate::client::PowerPredictor;
use crate::domain::FeatureRecord;
use crate::error::EngineResult;

type Respond = Box<dyn Fn(&FeatureRecord) -> EngineResult<f64> + Send + Sync>;
type Delay = Box<dyn Fn(&FeatureRecord) -> Duration + Send + Sync>;

/// Base URL of a local port with nothing listening on it
pub(crate) fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// Predictor that records the pm25 of every call and answers from a closure
pub(crate) struct RecordingPredictor {
    calls: Mutex<Vec<f64>>,
    respond: Respond,
    delay: Option<Delay>,
}

impl RecordingPredictor {
    pub(crate) fn new(
        respond: impl Fn(&FeatureRecord) -> EngineResult<f64> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
            delay: None,
        }
    }

    pub(crate) fn with_delay(
        mut self,
        delay: impl Fn(&FeatureRecord) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub(crate) fn calls(&self) -> Vec<f64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PowerPredictor for RecordingPredictor {
    async fn predict(&self, record: &FeatureRecord) -> EngineResult<f64> {
        self.calls.lock().unwrap().push(record.pm25);
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(record)).await;
        }
        (self.respond)(record)
    }
}
