// Test doubles for security engine collaborators
//
// Provides mock classifiers and recording listeners that can be injected into
// SecurityService for tests and demos.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BaseImageClassifier, StatusListener};
use crate::domains::security::models::AlarmStatus;

// =============================================================================
// Mock Image Classifier
// =============================================================================

#[derive(Debug, Clone)]
enum MockVerdict {
    Cat(bool),
    Fail(String),
}

/// Arguments captured from a classify call
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyCallArgs {
    pub image_len: usize,
    pub min_confidence: f32,
}

/// Classifier that returns scripted verdicts and records its calls.
///
/// Scripted verdicts are consumed in order; once exhausted, the default
/// verdict is returned.
pub struct MockImageClassifier {
    script: Arc<Mutex<Vec<MockVerdict>>>,
    default: MockVerdict,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<ClassifyCallArgs>>>,
}

impl MockImageClassifier {
    /// Classifier that always answers `verdict`.
    pub fn returning(verdict: bool) -> Self {
        Self {
            script: Arc::new(Mutex::new(Vec::new())),
            default: MockVerdict::Cat(verdict),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Classifier that always fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            default: MockVerdict::Fail(message.to_string()),
            ..Self::returning(false)
        }
    }

    /// Queue a verdict to be returned before the default.
    pub fn then_returning(self, verdict: bool) -> Self {
        self.script.lock().unwrap().push(MockVerdict::Cat(verdict));
        self
    }

    /// Sleep before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ClassifyCallArgs> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseImageClassifier for MockImageClassifier {
    async fn contains_cat(&self, image: &[u8], min_confidence: f32) -> Result<bool> {
        self.calls.lock().unwrap().push(ClassifyCallArgs {
            image_len: image.len(),
            min_confidence,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let verdict = {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                self.default.clone()
            } else {
                script.remove(0)
            }
        };

        match verdict {
            MockVerdict::Cat(detected) => Ok(detected),
            MockVerdict::Fail(message) => Err(anyhow!(message)),
        }
    }
}

// =============================================================================
// Recording Listener
// =============================================================================

/// Status listener that records every notification it receives.
#[derive(Default)]
pub struct RecordingListener {
    alarm_statuses: Mutex<Vec<AlarmStatus>>,
    cat_verdicts: Mutex<Vec<bool>>,
    sensor_list_changes: Mutex<usize>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alarm_statuses(&self) -> Vec<AlarmStatus> {
        self.alarm_statuses.lock().unwrap().clone()
    }

    pub fn cat_verdicts(&self) -> Vec<bool> {
        self.cat_verdicts.lock().unwrap().clone()
    }

    pub fn sensor_list_changes(&self) -> usize {
        *self.sensor_list_changes.lock().unwrap()
    }
}

impl StatusListener for RecordingListener {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        self.alarm_statuses.lock().unwrap().push(status);
    }

    fn on_cat_detected(&self, detected: bool) {
        self.cat_verdicts.lock().unwrap().push(detected);
    }

    fn on_sensor_list_changed(&self) {
        *self.sensor_list_changes.lock().unwrap() += 1;
    }
}
