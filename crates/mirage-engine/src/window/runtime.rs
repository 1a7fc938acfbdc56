use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, FrameStatus, StartCtx, UpdateCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::{translate_device_event, translate_window_event};
use crate::input::{InputEvent, InputFrame, InputState};
use crate::time::{FixedTimestep, FrameClock};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,

    /// Render targets are sized once at startup, so the default is a fixed-size window.
    pub resizable: bool,

    /// Hide and lock the cursor for mouse-look.
    pub grab_cursor: bool,

    /// Length of one simulation step.
    pub update_period: Duration,

    /// Upper bound on update steps run in one loop iteration.
    pub max_catch_up_steps: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "mirage".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            resizable: false,
            grab_cursor: true,
            update_period: Duration::from_micros(16_666),
            max_catch_up_steps: 10,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, starts `app` and runs until the app or the window
    /// system asks to exit.
    ///
    /// A failure in [`App::on_start`] is returned here.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.startup_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    stepper: Option<FixedTimestep>,
    frame_pending: bool,

    exit_requested: bool,
    exited: bool,
    startup_error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            stepper: None,
            frame_pending: false,
            exit_requested: false,
            exited: false,
            startup_error: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        if self.config.grab_cursor {
            grab_cursor(&window);
        }

        let gpu_init = self.gpu_init.clone();
        WindowEntryTryBuilder {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let entry = self.create_window_entry(event_loop)?;

        let app = &mut self.app;
        entry.with(|fields| {
            let mut ctx = StartCtx {
                window: WindowCtx {
                    window: fields.window,
                },
                gpu: fields.gpu,
            };
            app.on_start(&mut ctx)
        })?;

        self.entry = Some(entry);
        self.stepper = Some(FixedTimestep::new(
            self.config.update_period,
            self.config.max_catch_up_steps,
            Instant::now(),
        ));
        Ok(())
    }

    /// Runs the update steps that are due; returns when the next one is.
    fn run_due_steps(&mut self, event_loop: &ActiveEventLoop) -> Option<Instant> {
        let (Some(entry), Some(stepper)) = (self.entry.as_mut(), self.stepper.as_mut()) else {
            return None;
        };

        let now = Instant::now();
        if stepper.time_until_due(now).is_some() {
            return Some(stepper.next_due());
        }

        let steps = stepper.advance(now);
        let app = &mut self.app;
        let mut control = AppControl::Continue;

        entry.with_mut(|fields| {
            let mut mouse_delta = fields.input_frame.take_mouse_delta();
            for step in stepper.steps(steps) {
                let mut ctx = UpdateCtx {
                    input: fields.input_state,
                    mouse_delta: std::mem::take(&mut mouse_delta),
                    step,
                };
                if app.on_update(&mut ctx) == AppControl::Exit {
                    control = AppControl::Exit;
                    break;
                }
            }
            fields.input_frame.clear();
            fields.window.request_redraw();
        });

        self.frame_pending = true;
        let next = stepper.next_due();

        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
        Some(next)
    }

    fn draw_frame(&mut self, event_loop: &ActiveEventLoop) {
        if !self.frame_pending {
            return;
        }
        self.frame_pending = false;

        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let app = &mut self.app;
        let mut control = AppControl::Continue;
        entry.with_mut(|fields| {
            let time = fields.clock.tick();
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    window: fields.window,
                },
                gpu: fields.gpu,
                time,
            };
            control = app.on_frame(&mut ctx);
        });

        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }

    fn apply_input(&mut self, ev: InputEvent) {
        if let Some(entry) = self.entry.as_mut() {
            entry.with_mut(|fields| fields.input_state.apply_event(fields.input_frame, ev));
        }
    }

    /// Releases app resources, then the GPU context and window, in that order.
    fn shutdown(&mut self) {
        if self.exited {
            return;
        }
        self.exited = true;

        if self.entry.is_some() {
            self.app.on_exit();
        }
        self.entry = None;
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            log::error!("startup failed: {err:#}");
            self.startup_error = Some(err);
            self.request_exit(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(ev) = translate_window_event(&event) {
            self.apply_input(ev);
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),
            WindowEvent::RedrawRequested => self.draw_frame(event_loop),
            WindowEvent::Focused(true) if self.config.grab_cursor => {
                if let Some(entry) = self.entry.as_ref() {
                    entry.with_window(|w| grab_cursor(w));
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(ev) = translate_device_event(&event) {
            self.apply_input(ev);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match self.run_due_steps(event_loop) {
            Some(next) => event_loop.set_control_flow(ControlFlow::WaitUntil(next)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        log::warn!("cursor grab unavailable: {err}");
    }
    window.set_cursor_visible(false);
}
