pub mod sensor;
pub mod state;
pub mod status;

pub use sensor::*;
pub use state::*;
pub use status::*;
