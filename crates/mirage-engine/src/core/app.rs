use anyhow::Result;

use super::ctx::{FrameCtx, StartCtx, UpdateCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
///
/// Per loop iteration the runtime calls `on_update` zero or more times (one
/// call per fixed step that became due), then `on_frame` once.
pub trait App {
    /// Called once the window and GPU context exist.
    ///
    /// An error stops the event loop and is returned from `Runtime::run`.
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> Result<()>;

    /// Advances simulation state by one fixed step.
    fn on_update(&mut self, ctx: &mut UpdateCtx<'_>) -> AppControl;

    /// Renders one frame from the current state.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called before the GPU context is destroyed. Release GPU resources here.
    fn on_exit(&mut self) {}
}
