//! Mirage engine crate.
//!
//! Platform runtime and GPU device, the resource cache, shader compilation,
//! the deferred render passes with their GPU timers, and the demo scene that
//! drives them.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod resources;
pub mod shader;
pub mod mesh;
pub mod render;
pub mod timing;
pub mod overlay;
pub mod scene;
