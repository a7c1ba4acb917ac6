//! Injected capabilities
//!
//! The clock and identifier generator are the plugin's only collaborators
//! with ambient behavior; both are passed in explicitly so invocations stay
//! pure and testable.

pub mod clock;
pub mod ids;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{IdGenerator, RandomIdGenerator, SequentialIdGenerator};
