//! Image classifiers usable without a real vision service.

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::kernel::BaseImageClassifier;

/// Confidence threshold, in percent, the engine always asks for.
pub const CAT_CONFIDENCE_THRESHOLD: f32 = 50.0;

/// Classifier that answers at random, for demos without a vision backend.
///
/// Roughly half of all images "contain a cat". Empty images are rejected
/// so callers still see the failure path.
pub struct FakeImageClassifier {
    rng: std::sync::Mutex<fastrand::Rng>,
}

impl FakeImageClassifier {
    pub fn new() -> Self {
        Self {
            rng: std::sync::Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Deterministic verdict sequence for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: std::sync::Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for FakeImageClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseImageClassifier for FakeImageClassifier {
    async fn contains_cat(&self, image: &[u8], min_confidence: f32) -> Result<bool> {
        if image.is_empty() {
            bail!("image is empty");
        }

        let confidence = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|e| anyhow::anyhow!("rng mutex poisoned: {}", e))?;
            rng.f32() * 100.0
        };
        let detected = confidence >= min_confidence;

        debug!(
            image_bytes = image.len(),
            confidence,
            min_confidence,
            detected,
            "fake classifier verdict"
        );
        Ok(detected)
    }
}
