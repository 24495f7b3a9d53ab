//! Shared utilities: the generational arena, logging, and profiling helpers.

pub mod allocator;
pub mod logging;
pub mod profiling;

pub use allocator::{Arena, EntityId};
pub use logging::ScopedTimer;
pub use profiling::{PhaseTimer, StepProfile};
