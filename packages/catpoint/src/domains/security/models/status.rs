use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the system is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmingStatus {
    #[default]
    Disarmed,
    ArmedHome,
    ArmedAway,
}

impl ArmingStatus {
    pub const ALL: [ArmingStatus; 3] = [
        ArmingStatus::Disarmed,
        ArmingStatus::ArmedHome,
        ArmingStatus::ArmedAway,
    ];

    pub fn is_armed(self) -> bool {
        matches!(self, ArmingStatus::ArmedHome | ArmingStatus::ArmedAway)
    }

    pub fn description(self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "Disarmed",
            ArmingStatus::ArmedHome => "Armed - At Home",
            ArmingStatus::ArmedAway => "Armed - Away",
        }
    }
}

impl fmt::Display for ArmingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl FromStr for ArmingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "disarmed" => Ok(ArmingStatus::Disarmed),
            "home" | "armed_home" => Ok(ArmingStatus::ArmedHome),
            "away" | "armed_away" => Ok(ArmingStatus::ArmedAway),
            other => Err(format!("unknown arming status: {}", other)),
        }
    }
}

/// Alarm escalation level.
///
/// Ordered `NoAlarm < PendingAlarm < Alarm`. Transitions between levels are
/// table-driven in the alarm machine; the ordering only ranks severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    #[default]
    NoAlarm,
    PendingAlarm,
    Alarm,
}

impl AlarmStatus {
    pub const ALL: [AlarmStatus; 3] = [
        AlarmStatus::NoAlarm,
        AlarmStatus::PendingAlarm,
        AlarmStatus::Alarm,
    ];

    pub fn description(self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "Cool and Good",
            AlarmStatus::PendingAlarm => "I'm in Danger...",
            AlarmStatus::Alarm => "Awooga!",
        }
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_severity_ordering() {
        assert!(AlarmStatus::NoAlarm < AlarmStatus::PendingAlarm);
        assert!(AlarmStatus::PendingAlarm < AlarmStatus::Alarm);
    }

    #[test]
    fn only_home_and_away_are_armed() {
        assert!(!ArmingStatus::Disarmed.is_armed());
        assert!(ArmingStatus::ArmedHome.is_armed());
        assert!(ArmingStatus::ArmedAway.is_armed());
    }

    #[test]
    fn statuses_serialize_as_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&AlarmStatus::PendingAlarm).unwrap(),
            "\"PENDING_ALARM\""
        );
        assert_eq!(
            serde_json::to_string(&ArmingStatus::ArmedAway).unwrap(),
            "\"ARMED_AWAY\""
        );
    }

    #[test]
    fn arming_status_accepts_short_names() {
        assert_eq!("home".parse::<ArmingStatus>(), Ok(ArmingStatus::ArmedHome));
        assert_eq!("ARMED-AWAY".parse::<ArmingStatus>(), Ok(ArmingStatus::ArmedAway));
        assert!("panic".parse::<ArmingStatus>().is_err());
    }
}
