//! Security service - the engine's public entry point.
//!
//! Every operation is one critical section: the alarm machine decides, the
//! effect persists, listeners are notified, and only then is the lock
//! released. A listener that calls back into the service on the same thread
//! is not allowed to re-enter: mutations are queued and run right after the
//! current operation finishes, and queries are answered from the state
//! published when the machine made its decision.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;

use tracing::{debug, warn};

use crate::common::{SecurityError, StoreError};
use crate::domains::security::classifier::CAT_CONFIDENCE_THRESHOLD;
use crate::domains::security::effects::SecurityEffect;
use crate::domains::security::events::SecurityEvent;
use crate::domains::security::machines::AlarmMachine;
use crate::domains::security::models::{
    AlarmStatus, ArmingStatus, Sensor, SensorKey, StateSnapshot, SystemState,
};
use crate::kernel::{
    BaseImageClassifier, BaseStateStore, Machine, StatusHub, StatusListener,
    DEFAULT_LISTENER_BUDGET,
};

/// Default bound on a single classifier call.
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on deferred requests drained after one operation.
const MAX_DEFERRED_DRAIN: usize = 64;

/// Builder for [`SecurityService`].
pub struct SecurityServiceBuilder {
    store: Arc<dyn BaseStateStore>,
    classifier: Arc<dyn BaseImageClassifier>,
    classifier_timeout: Duration,
    listener_budget: Duration,
}

impl SecurityServiceBuilder {
    pub fn classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier_timeout = timeout;
        self
    }

    pub fn listener_budget(mut self, budget: Duration) -> Self {
        self.listener_budget = budget;
        self
    }

    /// Load the stored state and build the service.
    pub fn build(self) -> Result<SecurityService, StoreError> {
        let snapshot = self.store.load()?;
        debug!(
            sensors = snapshot.sensors.len(),
            arming_status = ?snapshot.arming_status,
            alarm_status = ?snapshot.alarm_status,
            "security state loaded"
        );

        let hub = Arc::new(StatusHub::with_budget(self.listener_budget));
        Ok(SecurityService {
            published: RwLock::new(snapshot.clone()),
            machine: Mutex::new(AlarmMachine::new(SystemState::restore(snapshot))),
            effect: SecurityEffect::new(self.store, hub),
            classifier: self.classifier,
            classifier_timeout: self.classifier_timeout,
            dispatching_on: Mutex::new(None),
            deferred: Mutex::new(VecDeque::new()),
        })
    }
}

/// Receives security updates, decides the resulting system state, persists
/// it and tells listeners.
pub struct SecurityService {
    machine: Mutex<AlarmMachine>,
    /// State as of the last decision, readable while the machine is locked.
    published: RwLock<StateSnapshot>,
    effect: SecurityEffect,
    classifier: Arc<dyn BaseImageClassifier>,
    classifier_timeout: Duration,
    dispatching_on: Mutex<Option<ThreadId>>,
    deferred: Mutex<VecDeque<SecurityEvent>>,
}

impl SecurityService {
    pub fn builder(
        store: Arc<dyn BaseStateStore>,
        classifier: Arc<dyn BaseImageClassifier>,
    ) -> SecurityServiceBuilder {
        SecurityServiceBuilder {
            store,
            classifier,
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
            listener_budget: DEFAULT_LISTENER_BUDGET,
        }
    }

    /// Build a service with default timeouts.
    pub fn new(
        store: Arc<dyn BaseStateStore>,
        classifier: Arc<dyn BaseImageClassifier>,
    ) -> Result<Self, StoreError> {
        Self::builder(store, classifier).build()
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Register a listener. Registering the same handle twice is a no-op.
    pub fn add_status_listener(&self, listener: Arc<dyn StatusListener>) {
        self.effect.hub().subscribe(listener);
    }

    pub fn remove_status_listener(&self, listener: &Arc<dyn StatusListener>) {
        self.effect.hub().unsubscribe(listener);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn alarm_status(&self) -> AlarmStatus {
        if self.is_dispatching_on_current_thread() {
            return self.read_published().alarm_status;
        }
        self.lock_machine().state().alarm_status()
    }

    pub fn arming_status(&self) -> ArmingStatus {
        if self.is_dispatching_on_current_thread() {
            return self.read_published().arming_status;
        }
        self.lock_machine().state().arming_status()
    }

    /// Sensors ordered by name, then type.
    pub fn sensors(&self) -> Vec<Sensor> {
        if self.is_dispatching_on_current_thread() {
            return self.read_published().sensors.clone();
        }
        self.lock_machine().state().sensors()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        if self.is_dispatching_on_current_thread() {
            return self.read_published().clone();
        }
        self.lock_machine().state().snapshot()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Set the arming mode. Disarming clears any alarm; arming resets every
    /// sensor to inactive.
    ///
    /// Called from a listener callback, this is deferred: it returns `Ok(())`
    /// before it runs, and a failure at that point is only logged.
    pub fn set_arming_status(&self, status: ArmingStatus) -> Result<(), SecurityError> {
        self.dispatch(SecurityEvent::ArmingStatusSet { status })
    }

    /// Record a sensor's activation state and update the alarm accordingly.
    ///
    /// Called from a listener callback, this is deferred: it returns `Ok(())`
    /// before it runs, and a failure at that point is only logged.
    pub fn change_sensor_activation(
        &self,
        key: &SensorKey,
        active: bool,
    ) -> Result<(), SecurityError> {
        self.dispatch(SecurityEvent::SensorActivationSet {
            key: key.clone(),
            active,
        })
    }

    /// Register a sensor. A sensor with the same name and type is left as is.
    ///
    /// Called from a listener callback, this is deferred: it returns `Ok(())`
    /// before it runs, and a failure at that point is only logged.
    pub fn add_sensor(&self, sensor: Sensor) -> Result<(), SecurityError> {
        self.dispatch(SecurityEvent::SensorAdded { sensor })
    }

    /// Unregister a sensor.
    ///
    /// Called from a listener callback, this is deferred: it returns `Ok(())`
    /// before it runs, and a failure at that point is only logged.
    pub fn remove_sensor(&self, key: &SensorKey) -> Result<(), SecurityError> {
        self.dispatch(SecurityEvent::SensorRemoved { key: key.clone() })
    }

    /// Classify a camera image and apply the verdict.
    ///
    /// The classifier runs outside the critical section. If it fails or
    /// times out, nothing changes and no listener is notified.
    pub async fn process_image(&self, image: &[u8]) -> Result<bool, SecurityError> {
        let detected = tokio::time::timeout(
            self.classifier_timeout,
            self.classifier.contains_cat(image, CAT_CONFIDENCE_THRESHOLD),
        )
        .await
        .map_err(|_| SecurityError::ClassificationTimeout(self.classifier_timeout))?
        .map_err(|e| SecurityError::Classification(format!("{:#}", e)))?;

        self.dispatch(SecurityEvent::CatDetected { detected })?;
        Ok(detected)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Run `event` now, or queue it if this thread is already inside an
    /// operation. Queued events report `Ok(())`; their own errors surface
    /// only as warnings when they are drained.
    fn dispatch(&self, event: SecurityEvent) -> Result<(), SecurityError> {
        if self.is_dispatching_on_current_thread() {
            debug!(event = ?event, "deferring re-entrant security request");
            self.lock_deferred().push_back(event);
            return Ok(());
        }

        let result = self.run(&event);
        self.drain_deferred();
        result
    }

    fn run(&self, event: &SecurityEvent) -> Result<(), SecurityError> {
        let mut machine = self.lock_machine();
        let _dispatching = DispatchGuard::enter(&self.dispatching_on);

        let commands = machine.decide(event).map_err(|e| {
            warn!(event = ?event, error = %e, "security request rejected");
            e
        })?;
        *self.published.write().unwrap_or_else(PoisonError::into_inner) =
            machine.state().snapshot();
        self.effect.execute_all(&commands)
    }

    fn drain_deferred(&self) {
        for _ in 0..MAX_DEFERRED_DRAIN {
            let Some(event) = self.lock_deferred().pop_front() else {
                return;
            };
            if let Err(e) = self.run(&event) {
                warn!(event = ?event, error = %e, "deferred security request failed");
            }
        }

        let dropped = {
            let mut deferred = self.lock_deferred();
            let dropped = deferred.len();
            deferred.clear();
            dropped
        };
        if dropped > 0 {
            warn!(dropped, "too many deferred security requests, dropping the rest");
        }
    }

    fn is_dispatching_on_current_thread(&self) -> bool {
        *self
            .dispatching_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            == Some(thread::current().id())
    }

    fn lock_machine(&self) -> MutexGuard<'_, AlarmMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_published(&self) -> RwLockReadGuard<'_, StateSnapshot> {
        self.published.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_deferred(&self) -> MutexGuard<'_, VecDeque<SecurityEvent>> {
        self.deferred.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks the current thread as inside a critical section until dropped.
struct DispatchGuard<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl<'a> DispatchGuard<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        Self { slot }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl std::fmt::Debug for SecurityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityService")
            .field("hub", self.effect.hub())
            .field("classifier_timeout", &self.classifier_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::security::models::SensorType;
    use crate::domains::security::store::InMemoryStore;
    use crate::kernel::{MockImageClassifier, RecordingListener};

    fn service_with(
        snapshot: StateSnapshot,
        classifier: MockImageClassifier,
    ) -> (SecurityService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::with_snapshot(snapshot));
        let service = SecurityService::new(store.clone(), Arc::new(classifier)).unwrap();
        (service, store)
    }

    #[test]
    fn test_starts_from_stored_state() {
        let snapshot = StateSnapshot {
            sensors: vec![Sensor::new("front", SensorType::Door).with_active(true)],
            arming_status: ArmingStatus::ArmedAway,
            alarm_status: AlarmStatus::PendingAlarm,
        };
        let (service, _) = service_with(snapshot.clone(), MockImageClassifier::returning(false));

        assert_eq!(service.snapshot(), snapshot);
    }

    #[test]
    fn test_guard_clears_dispatching_thread() {
        let (service, _) = service_with(StateSnapshot::default(), MockImageClassifier::returning(false));

        service.set_arming_status(ArmingStatus::ArmedHome).unwrap();

        assert!(!service.is_dispatching_on_current_thread());
    }

    struct DisarmOnAlarm {
        service: Mutex<Option<Arc<SecurityService>>>,
    }

    impl StatusListener for DisarmOnAlarm {
        fn on_alarm_status_changed(&self, status: AlarmStatus) {
            if status == AlarmStatus::Alarm {
                if let Some(service) = self.service.lock().unwrap().as_ref() {
                    // Would deadlock if it ran inside the critical section.
                    service.set_arming_status(ArmingStatus::Disarmed).unwrap();
                }
            }
        }

        fn on_cat_detected(&self, _detected: bool) {}
    }

    #[tokio::test]
    async fn test_reentrant_request_is_deferred_then_applied() {
        let store = Arc::new(InMemoryStore::with_snapshot(StateSnapshot {
            arming_status: ArmingStatus::ArmedHome,
            ..StateSnapshot::default()
        }));
        let service = Arc::new(
            SecurityService::new(store.clone(), Arc::new(MockImageClassifier::returning(true)))
                .unwrap(),
        );
        let listener = Arc::new(DisarmOnAlarm {
            service: Mutex::new(Some(service.clone())),
        });
        service.add_status_listener(listener.clone());

        let detected = service.process_image(b"cat.jpg").await.unwrap();

        assert!(detected);
        assert_eq!(service.alarm_status(), AlarmStatus::NoAlarm);
        assert_eq!(service.arming_status(), ArmingStatus::Disarmed);
        assert_eq!(store.load().unwrap().arming_status, ArmingStatus::Disarmed);

        // Break the Arc cycle.
        listener.service.lock().unwrap().take();
    }

    /// Refreshes its view of the sensors on every list change.
    struct SensorPanel {
        service: Mutex<std::sync::Weak<SecurityService>>,
        seen: Mutex<Vec<Vec<Sensor>>>,
    }

    impl StatusListener for SensorPanel {
        fn on_alarm_status_changed(&self, _status: AlarmStatus) {}

        fn on_cat_detected(&self, _detected: bool) {}

        fn on_sensor_list_changed(&self) {
            if let Some(service) = self.service.lock().unwrap().upgrade() {
                self.seen.lock().unwrap().push(service.sensors());
            }
        }
    }

    #[test]
    fn test_listener_can_query_during_notification() {
        let (service, _) = service_with(StateSnapshot::default(), MockImageClassifier::returning(false));
        let service = Arc::new(service);
        let panel = Arc::new(SensorPanel {
            service: Mutex::new(Arc::downgrade(&service)),
            seen: Mutex::new(Vec::new()),
        });
        service.add_status_listener(panel.clone());

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let worker = service.clone();
        thread::spawn(move || {
            let result = worker.add_sensor(Sensor::new("front", SensorType::Door));
            let _ = done_tx.send(result);
        });

        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("add_sensor did not return while a listener queried the service")
            .unwrap();

        assert_eq!(
            *panel.seen.lock().unwrap(),
            vec![vec![Sensor::new("front", SensorType::Door)]]
        );
        // Outside a notification queries go through the machine again.
        assert_eq!(service.sensors().len(), 1);
    }

    /// Tries to remove a sensor that does not exist whenever the list changes.
    struct RemovesGhost {
        service: Mutex<std::sync::Weak<SecurityService>>,
        results: Mutex<Vec<bool>>,
    }

    impl StatusListener for RemovesGhost {
        fn on_alarm_status_changed(&self, _status: AlarmStatus) {}

        fn on_cat_detected(&self, _detected: bool) {}

        fn on_sensor_list_changed(&self) {
            if let Some(service) = self.service.lock().unwrap().upgrade() {
                let ghost = SensorKey::new("attic", SensorType::Window);
                self.results
                    .lock()
                    .unwrap()
                    .push(service.remove_sensor(&ghost).is_ok());
            }
        }
    }

    #[test]
    fn test_deferred_mutation_reports_ok_and_failure_is_dropped() {
        let (service, store) = service_with(StateSnapshot::default(), MockImageClassifier::returning(false));
        let service = Arc::new(service);
        let listener = Arc::new(RemovesGhost {
            service: Mutex::new(Arc::downgrade(&service)),
            results: Mutex::new(Vec::new()),
        });
        service.add_status_listener(listener.clone());

        service
            .add_sensor(Sensor::new("front", SensorType::Door))
            .unwrap();

        // Queued, so the unknown sensor is not reported to the listener.
        assert_eq!(*listener.results.lock().unwrap(), vec![true]);
        assert_eq!(service.sensors(), vec![Sensor::new("front", SensorType::Door)]);
        assert_eq!(store.load().unwrap().sensors.len(), 1);
        assert!(service.lock_deferred().is_empty());
    }

    #[test]
    fn test_listener_sees_alarm_changes() {
        let (service, _) = service_with(StateSnapshot::default(), MockImageClassifier::returning(false));
        let recorder = Arc::new(RecordingListener::new());
        service.add_status_listener(recorder.clone());

        service
            .add_sensor(Sensor::new("front", SensorType::Door))
            .unwrap();
        service.set_arming_status(ArmingStatus::ArmedAway).unwrap();
        service
            .change_sensor_activation(&SensorKey::new("front", SensorType::Door), true)
            .unwrap();

        assert_eq!(recorder.alarm_statuses(), vec![AlarmStatus::PendingAlarm]);
        assert_eq!(recorder.sensor_list_changes(), 3);
    }
}
