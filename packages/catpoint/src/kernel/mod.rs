//! Kernel module - engine infrastructure and collaborator seams.

pub mod machine;
pub mod status_hub;
pub mod test_dependencies;
pub mod traits;

pub use machine::{Decision, Machine};
pub use status_hub::{StatusHub, DEFAULT_LISTENER_BUDGET};
pub use test_dependencies::{MockImageClassifier, RecordingListener};
pub use traits::*;
