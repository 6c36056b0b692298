use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::common::StoreError;
use crate::domains::security::models::{
    AlarmStatus, ArmingStatus, Sensor, SensorKey, StateSnapshot, SystemState,
};
use crate::kernel::BaseStateStore;

/// In-memory store backed by a `SystemState`.
///
/// Writes can be made to fail on demand, which is how tests exercise the
/// persistence failure path.
pub struct InMemoryStore {
    data: Mutex<SystemState>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_snapshot(StateSnapshot::default())
    }

    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            data: Mutex::new(SystemState::restore(snapshot)),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write<T>(&self, f: impl FnOnce(&mut SystemState) -> T) -> Result<T, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!("injected write failure")));
        }
        let mut data = self
            .data
            .lock()
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("mutex poisoned: {}", e)))?;
        Ok(f(&mut data))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseStateStore for InMemoryStore {
    fn load(&self) -> Result<StateSnapshot, StoreError> {
        let data = self
            .data
            .lock()
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("mutex poisoned: {}", e)))?;
        Ok(data.snapshot())
    }

    fn add_sensor(&self, sensor: &Sensor) -> Result<(), StoreError> {
        self.write(|data| {
            data.insert_sensor(sensor.clone());
        })
    }

    fn remove_sensor(&self, key: &SensorKey) -> Result<(), StoreError> {
        self.write(|data| {
            data.remove_sensor(key);
        })
    }

    fn update_sensor(&self, sensor: &Sensor) -> Result<(), StoreError> {
        self.write(|data| {
            let key = sensor.key();
            data.remove_sensor(&key);
            data.insert_sensor(sensor.clone());
        })
    }

    fn set_alarm_status(&self, status: AlarmStatus) -> Result<(), StoreError> {
        self.write(|data| data.set_alarm_status(status))
    }

    fn set_arming_status(&self, status: ArmingStatus) -> Result<(), StoreError> {
        self.write(|data| data.set_arming_status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::security::models::SensorType;

    #[test]
    fn test_empty_store_loads_defaults() {
        let store = InMemoryStore::new();
        assert_eq!(store.load().unwrap(), StateSnapshot::default());
    }

    #[test]
    fn test_update_replaces_by_identity() {
        let store = InMemoryStore::new();
        let door = Sensor::new("front", SensorType::Door);

        store.add_sensor(&door).unwrap();
        store.update_sensor(&door.clone().with_active(true)).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.sensors, vec![door.with_active(true)]);
    }

    #[test]
    fn test_injected_failure_blocks_writes() {
        let store = InMemoryStore::new();
        store.set_fail_writes(true);

        let result = store.set_alarm_status(AlarmStatus::Alarm);
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(store.load().unwrap().alarm_status, AlarmStatus::NoAlarm);

        store.set_fail_writes(false);
        store.set_alarm_status(AlarmStatus::Alarm).unwrap();
        assert_eq!(store.load().unwrap().alarm_status, AlarmStatus::Alarm);
    }
}
