//! GPU pass timing.
//!
//! Each frame gets a [`FrameQuerySet`] with one timer per pass. Sets are
//! queued after submission and drained in FIFO order once every timer in the
//! head set has a result, so reading timings never waits on the GPU.

mod gpu_timer;
mod pipeline;

pub use gpu_timer::{GpuTimer, GpuTimerPool};
pub use pipeline::{FrameQuerySet, PassTimer, PassTimings, QueryPipeline};
