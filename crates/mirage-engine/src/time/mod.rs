//! Time subsystem.
//!
//! Provides stable, testable timing utilities without coupling to the runtime:
//! - [`FixedTimestep`] schedules simulation steps at a constant period
//! - [`FrameClock`] measures wall time between presented frames

mod fixed_step;
mod frame_clock;

pub use fixed_step::{FixedTimestep, StepTime};
pub use frame_clock::{FrameClock, FrameTime};
