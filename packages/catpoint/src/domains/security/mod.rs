pub mod classifier;
pub mod commands;
pub mod effects;
pub mod events;
pub mod machines;
pub mod models;
pub mod service;
pub mod store;

pub use service::{SecurityService, SecurityServiceBuilder, DEFAULT_CLASSIFIER_TIMEOUT};
