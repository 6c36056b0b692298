// Infrastructure traits for security engine collaborators
//
// These are INFRASTRUCTURE traits only - no business logic.
// Alarm decisions live in the alarm machine and use these traits through effects.
//
// Naming convention: Base* for collaborator traits (e.g., BaseStateStore, BaseImageClassifier)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::StoreError;
use crate::domains::security::models::{
    AlarmStatus, ArmingStatus, Sensor, SensorKey, StateSnapshot,
};

// =============================================================================
// State Store
// =============================================================================

/// Durable storage for the security system state.
///
/// Every mutation persists or fails synchronously.
pub trait BaseStateStore: Send + Sync {
    /// Load the stored state. Missing fields load as their defaults
    /// (no sensors, disarmed, no alarm).
    fn load(&self) -> Result<StateSnapshot, StoreError>;

    fn add_sensor(&self, sensor: &Sensor) -> Result<(), StoreError>;

    fn remove_sensor(&self, key: &SensorKey) -> Result<(), StoreError>;

    /// Replace the stored record with the same identity.
    fn update_sensor(&self, sensor: &Sensor) -> Result<(), StoreError>;

    fn set_alarm_status(&self, status: AlarmStatus) -> Result<(), StoreError>;

    fn set_arming_status(&self, status: ArmingStatus) -> Result<(), StoreError>;
}

// =============================================================================
// Image Classifier
// =============================================================================

#[async_trait]
pub trait BaseImageClassifier: Send + Sync {
    /// Returns true if the image contains a cat with at least
    /// `min_confidence` percent confidence (e.g. 90.0 for 90%).
    async fn contains_cat(&self, image: &[u8], min_confidence: f32) -> Result<bool>;
}

// =============================================================================
// Status Listener
// =============================================================================

/// Observer of security status changes (displays, panels, loggers).
///
/// Calls are synchronous and made while the engine is busy, so
/// implementations must return quickly. Listeners may call back into the
/// engine. Queries answer with the state that is being announced. Mutations
/// are deferred until the current operation completes and report `Ok(())`
/// before they have run.
pub trait StatusListener: Send + Sync {
    fn on_alarm_status_changed(&self, status: AlarmStatus);

    fn on_cat_detected(&self, detected: bool);

    fn on_sensor_list_changed(&self) {}
}
