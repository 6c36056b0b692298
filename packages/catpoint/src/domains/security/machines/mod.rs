use crate::common::SecurityError;
use crate::domains::security::commands::SecurityCommand;
use crate::domains::security::events::SecurityEvent;
use crate::domains::security::models::{
    AlarmStatus, ArmingStatus, Sensor, SensorKey, SystemState,
};
use crate::kernel::{Decision, Machine};

/// Alarm Machine - sole authority over alarm status and sensor activity
///
/// Decision table:
/// 1. Disarm → NO_ALARM
/// 2. Arm (home or away) → every sensor reset to inactive
/// 3. Inactive sensor activated while armed → NO_ALARM→PENDING, PENDING→ALARM
/// 4. Active sensor activated again while PENDING → ALARM
/// 5. After any activation change: all sensors inactive and PENDING → NO_ALARM
/// 6. Cat seen while ARMED_HOME → ALARM
/// 7. No cat and all sensors inactive → NO_ALARM
///
/// ALARM is never demoted by sensor changes.
pub struct AlarmMachine {
    state: SystemState,
}

impl AlarmMachine {
    pub fn new(state: SystemState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    fn set_alarm(&mut self, status: AlarmStatus, commands: &mut Decision<SecurityCommand>) {
        self.state.set_alarm_status(status);
        commands.push(SecurityCommand::SetAlarmStatus(status));
    }

    fn arming_status_set(&mut self, status: ArmingStatus) -> Decision<SecurityCommand> {
        let mut commands = Decision::new();

        if status == ArmingStatus::Disarmed {
            self.set_alarm(AlarmStatus::NoAlarm, &mut commands);
        }

        if status.is_armed() {
            let keys: Vec<SensorKey> = self.state.sensors().iter().map(Sensor::key).collect();
            for key in &keys {
                if let Some(sensor) = self.state.set_sensor_active(key, false) {
                    commands.push(SecurityCommand::UpdateSensor(sensor));
                }
            }
            if !keys.is_empty() {
                commands.push(SecurityCommand::NotifySensorListChanged);
            }
        }

        self.state.set_arming_status(status);
        commands.push(SecurityCommand::SetArmingStatus(status));
        commands
    }

    fn sensor_activation_set(
        &mut self,
        key: &SensorKey,
        active: bool,
    ) -> Result<Decision<SecurityCommand>, SecurityError> {
        let current = self
            .state
            .sensor(key)
            .map(|sensor| sensor.active)
            .ok_or_else(|| SecurityError::UnknownSensor(key.clone()))?;

        let mut commands = Decision::new();
        let alarm = self.state.alarm_status();

        match (current, active) {
            // Deactivation never changes the alarm directly; the all-clear
            // check below handles a pending alarm.
            (true, false) => {}

            (false, true) => {
                if self.state.arming_status().is_armed() {
                    match alarm {
                        AlarmStatus::NoAlarm => {
                            self.set_alarm(AlarmStatus::PendingAlarm, &mut commands)
                        }
                        AlarmStatus::PendingAlarm => {
                            self.set_alarm(AlarmStatus::Alarm, &mut commands)
                        }
                        AlarmStatus::Alarm => {}
                    }
                }
            }

            (false, false) => {}

            // Repeated trigger escalates a pending alarm.
            (true, true) => {
                if alarm == AlarmStatus::PendingAlarm {
                    self.set_alarm(AlarmStatus::Alarm, &mut commands);
                }
            }
        }

        if let Some(sensor) = self.state.set_sensor_active(key, active) {
            commands.push(SecurityCommand::UpdateSensor(sensor));
        }

        if self.state.all_sensors_inactive()
            && self.state.alarm_status() == AlarmStatus::PendingAlarm
        {
            self.set_alarm(AlarmStatus::NoAlarm, &mut commands);
        }

        commands.push(SecurityCommand::NotifySensorListChanged);
        Ok(commands)
    }

    fn cat_detected(&mut self, detected: bool) -> Decision<SecurityCommand> {
        let mut commands = Decision::new();

        if detected && self.state.arming_status() == ArmingStatus::ArmedHome {
            self.set_alarm(AlarmStatus::Alarm, &mut commands);
        }
        if !detected && self.state.all_sensors_inactive() {
            self.set_alarm(AlarmStatus::NoAlarm, &mut commands);
        }

        commands.push(SecurityCommand::NotifyCatDetected(detected));
        commands
    }

    fn sensor_added(&mut self, sensor: &Sensor) -> Decision<SecurityCommand> {
        let mut commands = Decision::new();
        if self.state.insert_sensor(sensor.clone()) {
            commands.push(SecurityCommand::AddSensor(sensor.clone()));
            commands.push(SecurityCommand::NotifySensorListChanged);
        }
        commands
    }

    fn sensor_removed(
        &mut self,
        key: &SensorKey,
    ) -> Result<Decision<SecurityCommand>, SecurityError> {
        self.state
            .remove_sensor(key)
            .ok_or_else(|| SecurityError::UnknownSensor(key.clone()))?;

        let mut commands = Decision::new();
        commands.push(SecurityCommand::RemoveSensor(key.clone()));
        commands.push(SecurityCommand::NotifySensorListChanged);
        Ok(commands)
    }
}

impl Machine for AlarmMachine {
    type Event = SecurityEvent;
    type Command = SecurityCommand;
    type Error = SecurityError;

    fn decide(&mut self, event: &SecurityEvent) -> Result<Decision<SecurityCommand>, SecurityError> {
        match event {
            SecurityEvent::ArmingStatusSet { status } => Ok(self.arming_status_set(*status)),
            SecurityEvent::SensorActivationSet { key, active } => {
                self.sensor_activation_set(key, *active)
            }
            SecurityEvent::CatDetected { detected } => Ok(self.cat_detected(*detected)),
            SecurityEvent::SensorAdded { sensor } => Ok(self.sensor_added(sensor)),
            SecurityEvent::SensorRemoved { key } => self.sensor_removed(key),
        }
    }
}
