use serde::Serialize;
use std::path::{Path, PathBuf};
use strum::Display;

use crate::error::{EngineError, EngineResult};

/// Prefix prepended to the uploaded file name for the result artifact
pub const RESULT_PREFIX: &str = "predictions_";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BatchState {
    Idle,
    Selected,
    Submitting,
    Completed,
    Failed,
}

/// Uploaded tabular file, kept as opaque bytes
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl BatchFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        Ok(Self { filename, bytes })
    }

    pub fn result_filename(&self) -> String {
        format!("{RESULT_PREFIX}{}", self.filename)
    }
}

/// Tabular result returned by the batch endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct BatchArtifact {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl BatchArtifact {
    /// Write the artifact into `dir` under its derived file name
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.filename);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

/// Lifecycle of one batch upload.
///
/// `idle -> selected -> submitting -> completed | failed`, and removing the
/// file from any settled state returns to `idle`.
#[derive(Debug, Clone)]
pub struct BatchJob {
    state: BatchState,
    file: Option<BatchFile>,
    artifact: Option<BatchArtifact>,
    last_error: Option<EngineError>,
}

impl Default for BatchJob {
    fn default() -> Self {
        Self {
            state: BatchState::Idle,
            file: None,
            artifact: None,
            last_error: None,
        }
    }
}

impl BatchJob {
    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn file(&self) -> Option<&BatchFile> {
        self.file.as_ref()
    }

    pub fn artifact(&self) -> Option<&BatchArtifact> {
        self.artifact.as_ref()
    }

    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_submitting(&self) -> bool {
        self.state == BatchState::Submitting
    }

    /// Choose a file, replacing any previous one and its result
    pub fn select(&mut self, file: BatchFile) -> EngineResult<()> {
        self.ensure_settled("select a file")?;
        self.file = Some(file);
        self.artifact = None;
        self.last_error = None;
        self.state = BatchState::Selected;
        Ok(())
    }

    /// Enter `submitting`, returning the file to upload
    pub fn begin_submit(&mut self) -> EngineResult<BatchFile> {
        self.ensure_settled("submit")?;
        let file = self
            .file
            .clone()
            .ok_or_else(|| EngineError::Validation("no batch file selected".to_string()))?;
        self.artifact = None;
        self.last_error = None;
        self.state = BatchState::Submitting;
        Ok(file)
    }

    pub fn complete(&mut self, artifact: BatchArtifact) {
        self.artifact = Some(artifact);
        self.state = BatchState::Completed;
    }

    pub fn fail(&mut self, error: EngineError) {
        self.last_error = Some(error);
        self.state = BatchState::Failed;
    }

    /// Drop the file and any result, back to `idle`
    pub fn remove(&mut self) -> EngineResult<()> {
        self.ensure_settled("remove the file")?;
        *self = Self::default();
        Ok(())
    }

    fn ensure_settled(&self, action: &str) -> EngineResult<()> {
        if self.is_submitting() {
            return Err(EngineError::Validation(format!(
                "cannot {action} while a batch submission is in progress"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv() -> BatchFile {
        BatchFile::new("june.csv", b"pm25,hour\n42.7,12\n".to_vec())
    }

    #[test]
    fn test_happy_path() {
        let mut job = BatchJob::default();
        assert_eq!(job.state(), BatchState::Idle);

        job.select(csv()).unwrap();
        assert_eq!(job.state(), BatchState::Selected);

        let file = job.begin_submit().unwrap();
        assert_eq!(file.result_filename(), "predictions_june.csv");
        assert!(job.is_submitting());

        job.complete(BatchArtifact {
            filename: file.result_filename(),
            content_type: Some("text/csv".into()),
            bytes: b"predicted_power\n512.3\n".to_vec(),
        });
        assert_eq!(job.state(), BatchState::Completed);
        assert!(job.artifact().is_some());

        job.remove().unwrap();
        assert_eq!(job.state(), BatchState::Idle);
        assert!(!job.has_file());
        assert!(job.artifact().is_none());
    }

    #[test]
    fn test_failure_then_removal() {
        let mut job = BatchJob::default();
        job.select(csv()).unwrap();
        job.begin_submit().unwrap();
        job.fail(EngineError::Connectivity("connection refused".into()));

        assert_eq!(job.state(), BatchState::Failed);
        assert_eq!(job.last_error().map(|e| e.kind()), Some("connectivity"));

        job.remove().unwrap();
        assert_eq!(job.state(), BatchState::Idle);
        assert!(job.last_error().is_none());
    }

    #[test]
    fn test_locked_while_submitting() {
        let mut job = BatchJob::default();
        job.select(csv()).unwrap();
        job.begin_submit().unwrap();

        assert!(matches!(job.remove(), Err(EngineError::Validation(_))));
        assert!(matches!(job.select(csv()), Err(EngineError::Validation(_))));
        assert!(matches!(job.begin_submit(), Err(EngineError::Validation(_))));
        assert!(job.is_submitting());
    }

    #[test]
    fn test_submit_without_file() {
        let mut job = BatchJob::default();
        assert!(matches!(job.begin_submit(), Err(EngineError::Validation(_))));
        assert_eq!(job.state(), BatchState::Idle);
    }

    #[tokio::test]
    async fn test_artifact_save_and_read_back() {
        let dir = std::env::temp_dir().join(format!("pvp-batch-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let artifact = BatchArtifact {
            filename: "predictions_june.csv".into(),
            content_type: None,
            bytes: b"a,b\n1,2\n".to_vec(),
        };
        let path = artifact.save_to(&dir).await.unwrap();
        assert!(path.ends_with("predictions_june.csv"));

        let read_back = BatchFile::read(&path).await.unwrap();
        assert_eq!(read_back.filename, "predictions_june.csv");
        assert_eq!(read_back.bytes, artifact.bytes);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
