// Catpoint - home security engine
//
// Decides alarm status from sensor activity, arming mode, and camera
// cat-detection verdicts. Architecture follows the machine/effect split:
// the alarm machine decides, effects persist and notify.
//
// Collaborators (state store, image classifier, status listeners) are
// traits in kernel/ and are injected by the host.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
