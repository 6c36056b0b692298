// Common test utilities

use catpoint_core::domains::security::models::{
    AlarmStatus, ArmingStatus, Sensor, SensorType, StateSnapshot,
};
use catpoint_core::domains::security::store::InMemoryStore;
use catpoint_core::domains::security::SecurityService;
use catpoint_core::kernel::{MockImageClassifier, RecordingListener};
use std::sync::Arc;

/// A service wired to an in-memory store, a scripted classifier and a
/// recording listener.
pub struct Harness {
    pub service: SecurityService,
    pub store: Arc<InMemoryStore>,
    pub classifier: Arc<MockImageClassifier>,
    pub listener: Arc<RecordingListener>,
}

impl Harness {
    pub fn new(snapshot: StateSnapshot, classifier: MockImageClassifier) -> Self {
        let store = Arc::new(InMemoryStore::with_snapshot(snapshot));
        let classifier = Arc::new(classifier);
        let service = SecurityService::new(store.clone(), classifier.clone())
            .expect("in-memory store always loads");
        let listener = Arc::new(RecordingListener::new());
        service.add_status_listener(listener.clone());

        Self {
            service,
            store,
            classifier,
            listener,
        }
    }

    pub fn with_state(sensors: Vec<Sensor>, arming: ArmingStatus, alarm: AlarmStatus) -> Self {
        Self::new(
            StateSnapshot {
                sensors,
                arming_status: arming,
                alarm_status: alarm,
            },
            MockImageClassifier::returning(false),
        )
    }
}

pub fn door() -> Sensor {
    Sensor::new("front", SensorType::Door)
}

pub fn window() -> Sensor {
    Sensor::new("kitchen", SensorType::Window)
}

pub fn motion() -> Sensor {
    Sensor::new("hall", SensorType::Motion)
}
