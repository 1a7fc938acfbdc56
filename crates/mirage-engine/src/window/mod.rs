//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, wires them to the GPU
//! layer and drives the application on a fixed timestep.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
