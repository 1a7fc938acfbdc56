use winit::window::Window;

use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::input::{InputState, Key};
use crate::time::{FrameTime, StepTime};

/// Window handle and metadata.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Framebuffer size in physical pixels.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Context for [`App::on_start`](super::App::on_start).
pub struct StartCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a Gpu<'w>,
}

/// Context for one fixed update step.
pub struct UpdateCtx<'a> {
    pub input: &'a InputState,
    /// Raw mouse motion since the previous step that consumed it.
    pub mouse_delta: (f32, f32),
    pub step: StepTime,
}

impl UpdateCtx<'_> {
    pub fn key_down(&self, key: Key) -> bool {
        self.input.key_down(key)
    }
}

/// Outcome of [`FrameCtx::render`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    Presented,
    /// No surface texture was available; nothing was recorded.
    Skipped,
    /// The surface cannot recover.
    Fatal,
}

/// Context for [`App::on_frame`](super::App::on_frame).
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
}

impl<'w> FrameCtx<'_, 'w> {
    /// Acquires a surface frame, lets `draw` record into its encoder, then
    /// submits and presents it.
    pub fn render<F>(&mut self, draw: F) -> FrameStatus
    where
        F: FnOnce(&Gpu<'w>, &mut GpuFrame),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::warn!("failed to acquire surface texture: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => FrameStatus::Fatal,
                    _ => FrameStatus::Skipped,
                };
            }
        };

        draw(self.gpu, &mut frame);

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);
        FrameStatus::Presented
    }
}
