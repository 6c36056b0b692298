use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of physical sensor wired into the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    Door,
    Window,
    Motion,
}

impl SensorType {
    pub const ALL: [SensorType; 3] = [SensorType::Door, SensorType::Window, SensorType::Motion];
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorType::Door => write!(f, "DOOR"),
            SensorType::Window => write!(f, "WINDOW"),
            SensorType::Motion => write!(f, "MOTION"),
        }
    }
}

impl FromStr for SensorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DOOR" => Ok(SensorType::Door),
            "WINDOW" => Ok(SensorType::Window),
            "MOTION" => Ok(SensorType::Motion),
            other => Err(format!("unknown sensor type: {}", other)),
        }
    }
}

/// Identity of a sensor.
///
/// Field order gives the display ordering: name first, then type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SensorKey {
    pub name: String,
    pub sensor_type: SensorType,
}

impl SensorKey {
    pub fn new(name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            name: name.into(),
            sensor_type,
        }
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.sensor_type)
    }
}

/// A sensor record: identity plus its mutable activation flag.
///
/// `active` is not part of the identity. Two records with the same key
/// describe the same sensor, whatever their activation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    pub sensor_type: SensorType,
    #[serde(default)]
    pub active: bool,
}

impl Sensor {
    /// New sensors start inactive.
    pub fn new(name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            name: name.into(),
            sensor_type,
            active: false,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn key(&self) -> SensorKey {
        SensorKey::new(self.name.clone(), self.sensor_type)
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}): {}",
            self.name,
            self.sensor_type,
            if self.active { "Active" } else { "Inactive" }
        )
    }
}
