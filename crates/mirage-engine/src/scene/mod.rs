//! The demo scene: a room of procedurally stacked boxes, lit by a
//! directional light and rendered through the deferred passes with
//! screen-space reflections.
//!
//! [`Scene`] is the frame orchestrator. Per frame it drains finished timer
//! sets, records the five passes in [`PassId::ALL`] order (each bracketed by
//! its timer when timestamps are available), draws the overlay and queues the
//! frame's timer set behind the ones still in flight.

mod camera;
mod config;
mod hud;
mod layout;
mod lighting;
mod palette;
mod room;
mod state;

use std::rc::Rc;

use anyhow::{Context, Result};
use glam::Vec2;

use crate::core::{App, AppControl, FrameCtx, FrameStatus, StartCtx, UpdateCtx};
use crate::device::GpuFrame;
use crate::input::Key;
use crate::mesh::Mesh;
use crate::overlay::{find_font, Overlay};
use crate::render::stages::{
    draw_mesh, CompositeStage, GBufferStage, ResolveStage, ShadowStage, SsrStage, SsrUniforms,
};
use crate::render::{PassId, RenderCtx, SharedSamplers};
use crate::resources::ResourceCache;
use crate::shader::{load_program, register_shader_loaders, Program};
use crate::timing::{FrameQuerySet, GpuTimer, GpuTimerPool, QueryPipeline};

pub use camera::{Camera, CameraInput};
pub use config::{SceneConfig, FONT_VAR, SEED_VAR, SHADER_DIR_VAR};
pub use hud::{counter_lines, HELP_LINES};
pub use layout::{emit_boxes, seed_grid, BoxLayout, BoxPlacement, HeightGrid, LayoutError, LayoutParams};
pub use lighting::{Bounds, Lighting};
pub use palette::{Rgb, BOX_COLORS, RED};
pub use room::{initial_view, room_mesh, scene_bounds, BOTTOM_Y, MARGIN};
pub use state::{Controls, SceneState};

/// Direction the light travels, before normalization.
const LIGHT_DIRECTION: glam::Vec3 = glam::Vec3::new(0.5, -1.0, -0.5);
/// View-space length of a reflection ray.
const SSR_MAX_DISTANCE: f32 = 20.0;
/// Depth slack when matching a reflection ray against the depth buffer.
const SSR_THICKNESS: f32 = 0.3;

const HELP_ORIGIN: Vec2 = Vec2::new(10.0, 10.0);
const COUNTERS_ORIGIN: Vec2 = Vec2::new(10.0, 120.0);

// ── GPU side ───────────────────────────────────────────────────────────────

/// Everything that lives on the device. Dropped before the resource cache is
/// cleared.
struct SceneGpu {
    size: (u32, u32),
    gbuffer: GBufferStage,
    shadow: ShadowStage,
    resolve: ResolveStage,
    ssr: SsrStage,
    composite: CompositeStage,
    _samplers: SharedSamplers,
    lighting: Lighting,
    room: Mesh,
    boxes: Mesh,
    boxes_generation: u64,
    overlay: Overlay,
}

impl SceneGpu {
    fn new(
        ctx: &RenderCtx<'_>,
        config: &SceneConfig,
        cache: &mut ResourceCache<wgpu::Device>,
        state: &SceneState,
    ) -> Result<Self> {
        let device = ctx.device;
        let mut program = |files: [&str; 2]| -> Result<Rc<Program>> {
            let paths = files.map(|f| config.shader_dir.join(f));
            load_program(cache, device, &paths).with_context(|| format!("failed to build program {}", files.join(" + ")))
        };
        let geometry = program(["gbuffer.vert", "gbuffer.frag"])?;
        let depth = program(["gbuffer.vert", "depth_write.frag"])?;
        let resolve = program(["fullscreen.vert", "resolve.frag"])?;
        let ssr = program(["fullscreen.vert", "ssr.frag"])?;
        let composite = program(["fullscreen.vert", "composite.frag"])?;

        let lighting = Lighting::new(
            scene_bounds(&config.layout),
            LIGHT_DIRECTION,
            config.shadow_texel_size,
            device.limits().max_texture_dimension_2d,
        );

        let samplers = SharedSamplers::new(device);
        let gbuffer = GBufferStage::new(ctx, geometry).context("geometry stage")?;
        let shadow = ShadowStage::new(ctx, depth, lighting.shadow_resolution()).context("shadow stage")?;
        let resolve = ResolveStage::new(ctx, resolve, &gbuffer, &shadow, &samplers).context("resolve stage")?;
        let ssr = SsrStage::new(ctx, ssr, &gbuffer).context("reflection stage")?;
        let composite = CompositeStage::new(ctx, composite, &resolve, &ssr, &samplers).context("composite stage")?;

        let room = Mesh::new(device, "room", &room_mesh(&config.layout)?)?;
        let boxes = Mesh::new(device, "boxes", &state.layout().mesh())?;

        let font = find_font(config.font_path.as_deref());
        let overlay = Overlay::new(ctx, font);

        Ok(Self {
            size: ctx.size,
            gbuffer,
            shadow,
            resolve,
            ssr,
            composite,
            _samplers: samplers,
            lighting,
            room,
            boxes,
            boxes_generation: state.generation(),
            overlay,
        })
    }

    /// Re-uploads the box mesh after the layout changed.
    fn sync_boxes(&mut self, device: &wgpu::Device, state: &SceneState) -> Result<()> {
        if self.boxes_generation == state.generation() {
            return Ok(());
        }
        self.boxes = Mesh::new(device, "boxes", &state.layout().mesh())?;
        self.boxes_generation = state.generation();
        Ok(())
    }

    fn update_uniforms(&self, queue: &wgpu::Queue, state: &SceneState) {
        let (w, h) = self.size;
        let projection = state.camera.projection(w as f32 / h.max(1) as f32);
        let view = state.camera.view();

        self.gbuffer.update(queue, projection, view);
        self.shadow.update(queue, self.lighting.shadow_view_projection());
        self.resolve
            .update(queue, &self.lighting.resolve_uniforms(view, projection, self.size));

        let params = self.gbuffer.params(projection);
        self.ssr.update(
            queue,
            &SsrUniforms {
                projection,
                inverse_projection: params.inverse_projection,
                screen_size: params.screen_size,
                max_distance: SSR_MAX_DISTANCE,
                thickness: SSR_THICKNESS,
            },
        );
    }

    /// Fills this frame's overlay panels.
    fn prepare_overlay(&mut self, state: &SceneState, queries: &QueryPipeline<GpuTimer>, frame_seconds: f32) {
        self.overlay.begin_ui_frame();
        let help = self.overlay.panel(HELP_ORIGIN);
        for line in HELP_LINES {
            help.text(line);
        }
        if state.counters_visible() {
            let counters = self.overlay.panel(COUNTERS_ORIGIN);
            for line in counter_lines(queries.latest(), frame_seconds) {
                counters.text(line);
            }
        }
    }

    /// Records the whole frame into `frame`'s encoder.
    fn record(
        &mut self,
        ctx: &RenderCtx<'_>,
        frame: &mut GpuFrame,
        timers: Option<&FrameQuerySet<GpuTimer>>,
        reflections: bool,
    ) {
        let timer = |pass: PassId| timers.map(|set| set.timer(pass));
        let encoder = &mut frame.encoder;

        let mut pass = self.gbuffer.begin(encoder, timer(PassId::Geometry));
        draw_mesh(&mut pass, &self.room);
        draw_mesh(&mut pass, &self.boxes);
        pass.end();

        let mut pass = self.shadow.begin(encoder, timer(PassId::Shadow));
        draw_mesh(&mut pass, &self.room);
        draw_mesh(&mut pass, &self.boxes);
        pass.end();

        self.resolve.record(encoder, timer(PassId::Resolve));
        self.ssr.record(encoder, timer(PassId::Reflection), reflections);
        self.composite.record(encoder, &frame.view, timer(PassId::Composite));

        self.overlay.end_ui_frame(ctx, encoder, &frame.view);

        if let Some(set) = timers {
            for pass in PassId::ALL {
                set.timer(pass).resolve(encoder);
            }
        }
    }
}

// ── orchestrator ───────────────────────────────────────────────────────────

pub struct Scene {
    config: SceneConfig,
    state: SceneState,
    cache: ResourceCache<wgpu::Device>,
    gpu: Option<SceneGpu>,
    timer_pool: Option<GpuTimerPool>,
    queries: QueryPipeline<GpuTimer>,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Result<Self> {
        let state = SceneState::new(&config).context("failed to generate the initial layout")?;
        Ok(Self {
            config,
            state,
            cache: ResourceCache::new(),
            gpu: None,
            timer_pool: None,
            queries: QueryPipeline::new(),
        })
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }
}

fn controls(ctx: &UpdateCtx<'_>) -> Controls {
    Controls {
        camera: CameraInput {
            forward: ctx.key_down(Key::W),
            back: ctx.key_down(Key::S),
            left: ctx.key_down(Key::A),
            right: ctx.key_down(Key::D),
            up: ctx.key_down(Key::Space),
            down: ctx.key_down(Key::Shift),
            look: ctx.mouse_delta,
        },
        toggle_reflections: ctx.key_down(Key::Q),
        regenerate: ctx.key_down(Key::E),
        toggle_counters: ctx.key_down(Key::R),
    }
}

impl App for Scene {
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> Result<()> {
        let (w, h) = ctx.window.framebuffer_size();
        let render = RenderCtx::new(
            ctx.gpu.device(),
            ctx.gpu.queue(),
            ctx.gpu.surface_format(),
            (w.max(1), h.max(1)),
        );

        register_shader_loaders(&mut self.cache);
        let gpu = SceneGpu::new(&render, &self.config, &mut self.cache, &self.state)
            .with_context(|| format!("failed to set up the scene from {}", self.config.shader_dir.display()))?;

        self.timer_pool = if ctx.gpu.has_feature(wgpu::Features::TIMESTAMP_QUERY) {
            Some(GpuTimerPool::new(ctx.gpu.timestamp_period()))
        } else {
            log::warn!("TIMESTAMP_QUERY unavailable; pass timings disabled");
            None
        };
        log::info!(
            "scene ready on {}: {w}x{h}, shadow map {}, overlay {}, {} boxes, {} cached resources",
            ctx.gpu.adapter_info().name,
            gpu.shadow.resolution(),
            if gpu.overlay.is_enabled() { "on" } else { "off" },
            self.state.layout().boxes.len(),
            self.cache.len(),
        );
        self.gpu = Some(gpu);
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut UpdateCtx<'_>) -> AppControl {
        if ctx.key_down(Key::Escape) {
            return AppControl::Exit;
        }
        match self.state.step(&controls(ctx), ctx.step.dt) {
            Ok(()) => AppControl::Continue,
            Err(err) => {
                log::error!("layout regeneration failed: {err}");
                AppControl::Exit
            }
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(gpu) = self.gpu.as_mut() else {
            return AppControl::Continue;
        };

        ctx.gpu.poll();
        self.queries.drain();

        if let Err(err) = gpu.sync_boxes(ctx.gpu.device(), &self.state) {
            log::error!("failed to upload boxes: {err:#}");
            return AppControl::Exit;
        }
        gpu.update_uniforms(ctx.gpu.queue(), &self.state);
        gpu.prepare_overlay(&self.state, &self.queries, ctx.time.smoothed_dt);

        let set = match self.timer_pool.as_mut() {
            Some(pool) => {
                let device = ctx.gpu.device();
                Some(self.queries.acquire(|| pool.make_set(device)))
            }
            None => None,
        };

        let reflections = self.state.reflections_enabled();
        let status = ctx.render(|g, frame| {
            let render = RenderCtx::new(g.device(), g.queue(), g.surface_format(), gpu.size);
            gpu.record(&render, frame, set.as_ref(), reflections);
        });

        match (status, set) {
            (FrameStatus::Presented, Some(mut set)) => {
                for timer in set.timers_mut() {
                    timer.request_readback();
                }
                self.queries.push(set);
            }
            (FrameStatus::Presented, None) => {}
            (FrameStatus::Skipped, set) => {
                if let Some(set) = set {
                    self.queries.release(set);
                }
            }
            (FrameStatus::Fatal, _) => {
                log::error!("surface cannot be recovered; exiting");
                return AppControl::Exit;
            }
        }
        AppControl::Continue
    }

    fn on_exit(&mut self) {
        // Stages and meshes hold the cached programs; drop them first.
        self.gpu = None;
        self.queries.clear();
        self.cache.clear();
    }
}
