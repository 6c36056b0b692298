use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::common::SecurityError;
use crate::domains::security::commands::SecurityCommand;
use crate::kernel::{BaseStateStore, StatusHub};

/// Security Effect - executes alarm machine commands
///
/// Persists state mutations through the store and fans notifications out
/// through the hub. A failed write does not stop the remaining commands:
/// the machine has already committed the transition in memory, so the
/// store is brought as close to it as possible and listeners still hear
/// about it. The first failure is returned.
pub struct SecurityEffect {
    store: Arc<dyn BaseStateStore>,
    hub: Arc<StatusHub>,
}

impl SecurityEffect {
    pub fn new(store: Arc<dyn BaseStateStore>, hub: Arc<StatusHub>) -> Self {
        Self { store, hub }
    }

    pub fn hub(&self) -> &Arc<StatusHub> {
        &self.hub
    }

    pub fn execute_all(&self, commands: &[SecurityCommand]) -> Result<(), SecurityError> {
        let mut first_error = None;

        for cmd in commands {
            if let Err(e) = self.execute(cmd) {
                warn!(command = ?cmd, error = %e, "failed to persist security command");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn execute(&self, cmd: &SecurityCommand) -> Result<(), SecurityError> {
        if cmd.is_persistent() {
            debug!(command = ?cmd, "persisting security command");
        }

        match cmd {
            SecurityCommand::SetAlarmStatus(status) => {
                info!(alarm_status = ?status, "alarm status set");
                let persisted = self.store.set_alarm_status(*status);
                self.hub.notify_alarm_status(*status);
                persisted?;
            }
            SecurityCommand::SetArmingStatus(status) => {
                info!(arming_status = ?status, "arming status set");
                self.store.set_arming_status(*status)?;
            }
            SecurityCommand::AddSensor(sensor) => {
                info!(sensor = %sensor.key(), "sensor added");
                self.store.add_sensor(sensor)?;
            }
            SecurityCommand::RemoveSensor(key) => {
                info!(sensor = %key, "sensor removed");
                self.store.remove_sensor(key)?;
            }
            SecurityCommand::UpdateSensor(sensor) => {
                debug!(sensor = %sensor.key(), active = sensor.active, "sensor updated");
                self.store.update_sensor(sensor)?;
            }
            SecurityCommand::NotifyCatDetected(detected) => {
                info!(detected, "cat detection verdict");
                self.hub.notify_cat_detected(*detected);
            }
            SecurityCommand::NotifySensorListChanged => {
                self.hub.notify_sensor_list_changed();
            }
        }

        Ok(())
    }
}
