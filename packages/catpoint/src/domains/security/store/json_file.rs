use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::common::StoreError;
use crate::domains::security::models::{
    AlarmStatus, ArmingStatus, Sensor, SensorKey, StateSnapshot, SystemState,
};
use crate::kernel::BaseStateStore;

/// Store that keeps the whole state in one JSON document on disk.
///
/// Every mutation rewrites the document through a temporary sibling file
/// and a rename, so a crash never leaves a half-written state file. The
/// cached state only advances once the write succeeded.
pub struct JsonFileStore {
    path: PathBuf,
    cache: Mutex<SystemState>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file loads as the default state.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let snapshot = read_snapshot(&path)?;
        debug!(
            path = %path.display(),
            sensors = snapshot.sensors.len(),
            "opened state file"
        );

        Ok(Self {
            path,
            cache: Mutex::new(SystemState::restore(snapshot)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, f: impl FnOnce(&mut SystemState)) -> Result<(), StoreError> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("mutex poisoned: {}", e)))?;

        let mut next = cache.clone();
        f(&mut next);
        write_snapshot(&self.path, &next.snapshot())?;
        *cache = next;
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<StateSnapshot, StoreError> {
    match fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(StateSnapshot::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateSnapshot::default()),
        Err(e) => Err(e.into()),
    }
}

fn write_snapshot(path: &Path, snapshot: &StateSnapshot) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(snapshot)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(&json)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl BaseStateStore for JsonFileStore {
    fn load(&self) -> Result<StateSnapshot, StoreError> {
        let cache = self
            .cache
            .lock()
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("mutex poisoned: {}", e)))?;
        Ok(cache.snapshot())
    }

    fn add_sensor(&self, sensor: &Sensor) -> Result<(), StoreError> {
        self.write(|state| {
            state.insert_sensor(sensor.clone());
        })
    }

    fn remove_sensor(&self, key: &SensorKey) -> Result<(), StoreError> {
        self.write(|state| {
            state.remove_sensor(key);
        })
    }

    fn update_sensor(&self, sensor: &Sensor) -> Result<(), StoreError> {
        self.write(|state| {
            state.remove_sensor(&sensor.key());
            state.insert_sensor(sensor.clone());
        })
    }

    fn set_alarm_status(&self, status: AlarmStatus) -> Result<(), StoreError> {
        self.write(|state| state.set_alarm_status(status))
    }

    fn set_arming_status(&self, status: ArmingStatus) -> Result<(), StoreError> {
        self.write(|state| state.set_arming_status(status))
    }
}
