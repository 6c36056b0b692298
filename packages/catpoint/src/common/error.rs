//! Error types for the security engine and its collaborators.
//!
//! `SecurityError` is what engine operations return. Hosts that show errors
//! to people should go through [`Categorizable`], which never leaks store or
//! classifier internals.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::domains::security::models::SensorKey;

// =============================================================================
// Safe Error Category
// =============================================================================

/// Error category for sanitized, user-facing reporting.
///
/// - `NotFound`: safe to expose details
/// - `InternalError`: never expose details
/// - `ExternalService`: never expose details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeErrorCategory {
    NotFound,
    InternalError,
    ExternalService,
}

impl fmt::Display for SafeErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafeErrorCategory::NotFound => write!(f, "not_found"),
            SafeErrorCategory::InternalError => write!(f, "internal_error"),
            SafeErrorCategory::ExternalService => write!(f, "external_service_error"),
        }
    }
}

/// Errors that can be categorized for safe external exposure.
///
/// Only `NotFound` may return its Display string verbatim; other categories
/// must return generic messages.
pub trait Categorizable: std::error::Error {
    fn category(&self) -> SafeErrorCategory;

    fn safe_message(&self) -> Cow<'static, str>;
}

// =============================================================================
// Store Error
// =============================================================================

/// Errors from a state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored state could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure (lock poisoning, injected failures, ...).
    #[error("storage backend error: {0}")]
    Backend(anyhow::Error),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Backend(err)
    }
}

// =============================================================================
// Security Error
// =============================================================================

/// Errors returned by security engine operations.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// The store could not durably apply a mutation. The in-memory
    /// transition has already happened.
    #[error("failed to persist security state: {0}")]
    Persistence(#[from] StoreError),

    /// The classifier could not produce a verdict.
    #[error("image classification failed: {0}")]
    Classification(String),

    /// The classifier did not answer in time.
    #[error("image classification timed out after {0:?}")]
    ClassificationTimeout(Duration),

    /// The operation referenced a sensor that is not registered.
    #[error("unknown sensor: {0}")]
    UnknownSensor(SensorKey),
}

impl Categorizable for SecurityError {
    fn category(&self) -> SafeErrorCategory {
        match self {
            SecurityError::Persistence(_) => SafeErrorCategory::InternalError,
            SecurityError::Classification(_) | SecurityError::ClassificationTimeout(_) => {
                SafeErrorCategory::ExternalService
            }
            SecurityError::UnknownSensor(_) => SafeErrorCategory::NotFound,
        }
    }

    fn safe_message(&self) -> Cow<'static, str> {
        match self {
            SecurityError::UnknownSensor(_) => self.to_string().into(),
            SecurityError::Persistence(_) => "Security state could not be saved".into(),
            SecurityError::Classification(_) | SecurityError::ClassificationTimeout(_) => {
                "Camera image could not be checked".into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::security::models::SensorType;

    #[test]
    fn unknown_sensor_message_is_exposed() {
        let err = SecurityError::UnknownSensor(SensorKey::new("garage", SensorType::Door));

        assert_eq!(err.category(), SafeErrorCategory::NotFound);
        assert_eq!(err.safe_message(), "unknown sensor: garage(DOOR)");
    }

    #[test]
    fn store_details_are_hidden() {
        let err = SecurityError::from(StoreError::Backend(anyhow::anyhow!(
            "disk /dev/sda1 is full"
        )));

        assert_eq!(err.category(), SafeErrorCategory::InternalError);
        assert!(!err.safe_message().contains("sda1"));
        assert!(err.to_string().contains("sda1"));
    }

    #[test]
    fn classifier_failures_are_external() {
        let err = SecurityError::ClassificationTimeout(Duration::from_secs(10));
        assert_eq!(err.category(), SafeErrorCategory::ExternalService);
        assert_eq!(err.category().to_string(), "external_service_error");
    }
}
