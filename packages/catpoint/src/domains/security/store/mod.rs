//! State store implementations.
//!
//! - [`InMemoryStore`]: process-local, with write-failure injection
//! - [`JsonFileStore`]: one JSON document on disk, survives restarts

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;
