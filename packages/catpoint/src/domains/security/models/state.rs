use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{AlarmStatus, ArmingStatus, Sensor, SensorKey};

/// Serializable form of the system state, as kept by a state store.
///
/// Every field defaults, so a partially written or empty record loads as
/// "no sensors, disarmed, no alarm".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub sensors: Vec<Sensor>,
    #[serde(default)]
    pub arming_status: ArmingStatus,
    #[serde(default)]
    pub alarm_status: AlarmStatus,
}

/// The live (sensors, arming, alarm) triple.
///
/// Sensors are keyed by identity so toggling `active` is an update of the
/// existing record, never a remove/insert of a different value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemState {
    sensors: BTreeMap<SensorKey, Sensor>,
    arming_status: ArmingStatus,
    alarm_status: AlarmStatus,
}

impl SystemState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild state from a snapshot. Later duplicates of an identity win.
    pub fn restore(snapshot: StateSnapshot) -> Self {
        let sensors = snapshot
            .sensors
            .into_iter()
            .map(|sensor| (sensor.key(), sensor))
            .collect();

        Self {
            sensors,
            arming_status: snapshot.arming_status,
            alarm_status: snapshot.alarm_status,
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            sensors: self.sensors(),
            arming_status: self.arming_status,
            alarm_status: self.alarm_status,
        }
    }

    pub fn arming_status(&self) -> ArmingStatus {
        self.arming_status
    }

    pub fn alarm_status(&self) -> AlarmStatus {
        self.alarm_status
    }

    pub(crate) fn set_arming_status(&mut self, status: ArmingStatus) {
        self.arming_status = status;
    }

    pub(crate) fn set_alarm_status(&mut self, status: AlarmStatus) {
        self.alarm_status = status;
    }

    /// Sensors in display order (name, then type).
    pub fn sensors(&self) -> Vec<Sensor> {
        self.sensors.values().cloned().collect()
    }

    pub fn sensor(&self, key: &SensorKey) -> Option<&Sensor> {
        self.sensors.get(key)
    }

    pub fn contains(&self, key: &SensorKey) -> bool {
        self.sensors.contains_key(key)
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn all_sensors_inactive(&self) -> bool {
        self.sensors.values().all(|sensor| !sensor.active)
    }

    /// Insert a sensor if its identity is new. Returns false if it already existed.
    pub(crate) fn insert_sensor(&mut self, sensor: Sensor) -> bool {
        let key = sensor.key();
        if self.sensors.contains_key(&key) {
            return false;
        }
        self.sensors.insert(key, sensor);
        true
    }

    pub(crate) fn remove_sensor(&mut self, key: &SensorKey) -> Option<Sensor> {
        self.sensors.remove(key)
    }

    /// Set the activation flag of an existing sensor and return the updated record.
    pub(crate) fn set_sensor_active(&mut self, key: &SensorKey, active: bool) -> Option<Sensor> {
        let sensor = self.sensors.get_mut(key)?;
        sensor.active = active;
        Some(sensor.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::security::models::SensorType;

    #[test]
    fn default_state_is_empty_disarmed_no_alarm() {
        let state = SystemState::new();

        assert_eq!(state.sensor_count(), 0);
        assert_eq!(state.arming_status(), ArmingStatus::Disarmed);
        assert_eq!(state.alarm_status(), AlarmStatus::NoAlarm);
        assert!(state.all_sensors_inactive());
    }

    #[test]
    fn toggling_activation_keeps_a_single_entry() {
        let mut state = SystemState::new();
        let door = Sensor::new("front", SensorType::Door);
        let key = door.key();
        state.insert_sensor(door);

        state.set_sensor_active(&key, true);
        state.set_sensor_active(&key, false);
        state.set_sensor_active(&key, true);

        assert_eq!(state.sensor_count(), 1);
        assert!(state.sensor(&key).unwrap().active);
    }

    #[test]
    fn insert_rejects_existing_identity() {
        let mut state = SystemState::new();
        assert!(state.insert_sensor(Sensor::new("front", SensorType::Door)));
        assert!(!state.insert_sensor(Sensor::new("front", SensorType::Door).with_active(true)));

        let key = SensorKey::new("front", SensorType::Door);
        assert!(!state.sensor(&key).unwrap().active);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut state = SystemState::new();
        state.insert_sensor(Sensor::new("window", SensorType::Window).with_active(true));
        state.insert_sensor(Sensor::new("hall", SensorType::Motion));
        state.set_arming_status(ArmingStatus::ArmedAway);
        state.set_alarm_status(AlarmStatus::PendingAlarm);

        let restored = SystemState::restore(state.snapshot());
        assert_eq!(restored, state);
    }

    #[test]
    fn missing_snapshot_fields_default() {
        let snapshot: StateSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, StateSnapshot::default());

        let snapshot: StateSnapshot =
            serde_json::from_str(r#"{"arming_status":"ARMED_HOME"}"#).unwrap();
        assert_eq!(snapshot.arming_status, ArmingStatus::ArmedHome);
        assert_eq!(snapshot.alarm_status, AlarmStatus::NoAlarm);
        assert!(snapshot.sensors.is_empty());
    }
}
