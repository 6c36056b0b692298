//! Security events - FACT EVENTS ONLY
//!
//! Events describe something that happened at the edge: a user changed the
//! arming mode, a sensor reported, the camera classifier answered. The alarm
//! machine turns each one into the commands the new state requires.

use crate::domains::security::models::{ArmingStatus, Sensor, SensorKey};

#[derive(Debug, Clone, PartialEq)]
pub enum SecurityEvent {
    /// The arming mode was set (possibly to its current value)
    ArmingStatusSet { status: ArmingStatus },

    /// A sensor reported its activation state
    SensorActivationSet { key: SensorKey, active: bool },

    /// The camera classifier returned a verdict
    CatDetected { detected: bool },

    /// A sensor was registered
    SensorAdded { sensor: Sensor },

    /// A sensor was unregistered
    SensorRemoved { key: SensorKey },
}
