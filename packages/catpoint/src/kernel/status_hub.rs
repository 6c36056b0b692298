//! In-process fan-out hub for security status observers.
//!
//! Listeners are registered by handle. Subscribing the same `Arc` twice is a
//! no-op; delivery order between listeners is unspecified.
//!
//! # Failure policy
//!
//! - A listener that panics is isolated: the panic is caught and logged, and
//!   the remaining listeners still run.
//! - A listener that takes longer than the notification budget is logged.
//!   It cannot be pre-empted, so listeners must stay quick.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::{error, warn};

use super::traits::StatusListener;
use crate::domains::security::models::AlarmStatus;

/// Default per-listener notification budget.
pub const DEFAULT_LISTENER_BUDGET: Duration = Duration::from_millis(250);

type ListenerKey = usize;

fn listener_key(listener: &Arc<dyn StatusListener>) -> ListenerKey {
    Arc::as_ptr(listener) as *const () as usize
}

/// Registry of status listeners with synchronous, unordered fan-out.
pub struct StatusHub {
    listeners: RwLock<HashMap<ListenerKey, Arc<dyn StatusListener>>>,
    budget: Duration,
}

impl StatusHub {
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_LISTENER_BUDGET)
    }

    pub fn with_budget(budget: Duration) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            budget,
        }
    }

    /// Register a listener. Returns false if this handle was already registered.
    pub fn subscribe(&self, listener: Arc<dyn StatusListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let key = listener_key(&listener);
        if listeners.contains_key(&key) {
            return false;
        }
        listeners.insert(key, listener);
        true
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, listener: &Arc<dyn StatusListener>) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&listener_key(listener))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify_alarm_status(&self, status: AlarmStatus) {
        self.fan_out("alarm_status_changed", |l| l.on_alarm_status_changed(status));
    }

    pub fn notify_cat_detected(&self, detected: bool) {
        self.fan_out("cat_detected", |l| l.on_cat_detected(detected));
    }

    pub fn notify_sensor_list_changed(&self) {
        self.fan_out("sensor_list_changed", |l| l.on_sensor_list_changed());
    }

    /// Call `f` on every listener.
    ///
    /// Works on a copy of the registry so listeners may subscribe or
    /// unsubscribe while being notified.
    fn fan_out(&self, notification: &'static str, f: impl Fn(&dyn StatusListener)) {
        let listeners: Vec<Arc<dyn StatusListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            let started = Instant::now();
            let result = catch_unwind(AssertUnwindSafe(|| f(listener.as_ref())));
            let elapsed = started.elapsed();

            if let Err(panic_info) = result {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };

                error!(
                    notification,
                    panic = %panic_msg,
                    "status listener panicked"
                );
            }

            if elapsed > self.budget {
                warn!(
                    notification,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = self.budget.as_millis() as u64,
                    "status listener exceeded notification budget"
                );
            }
        }
    }
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatusHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusHub")
            .field("listener_count", &self.len())
            .field("budget", &self.budget)
            .finish()
    }
}
