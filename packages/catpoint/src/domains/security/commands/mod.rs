use crate::domains::security::models::{AlarmStatus, ArmingStatus, Sensor, SensorKey};

/// State mutations and notifications decided by the alarm machine.
///
/// Commands are applied in the order the machine returns them.
#[derive(Debug, Clone, PartialEq)]
pub enum SecurityCommand {
    /// Persist the alarm status and notify alarm listeners
    SetAlarmStatus(AlarmStatus),

    /// Persist the arming status
    SetArmingStatus(ArmingStatus),

    /// Persist a newly registered sensor
    AddSensor(Sensor),

    /// Delete a sensor from storage
    RemoveSensor(SensorKey),

    /// Replace the stored record for this sensor's identity
    UpdateSensor(Sensor),

    /// Tell listeners what the camera saw
    NotifyCatDetected(bool),

    /// Tell listeners the sensor list (or a sensor's state) changed
    NotifySensorListChanged,
}

impl SecurityCommand {
    /// Whether this command writes to the state store.
    pub fn is_persistent(&self) -> bool {
        !matches!(
            self,
            SecurityCommand::NotifyCatDetected(_) | SecurityCommand::NotifySensorListChanged
        )
    }
}
