pub mod events;
pub mod geo;
pub mod telemetry;

pub use events::*;
pub use geo::*;
pub use telemetry::*;
