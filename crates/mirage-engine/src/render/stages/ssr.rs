use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::render::binding::{InputBinder, InputLayout, PassBinder, UniformBlock, INPUT_GROUP, UNIFORM_GROUP};
use crate::render::pipeline::{build_pipeline, open_pass, PipelineDesc};
use crate::render::target::{clear_color, RenderTexture};
use crate::render::{PassId, RenderCtx, Slot};
use crate::shader::{Program, ShaderError};
use crate::timing::GpuTimer;

use super::gbuffer::GBufferStage;
use super::FULLSCREEN_VERTICES;

const TEXCOORD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Sint;
const VISIBILITY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Texel coordinate written where no reflection was found.
pub const MISS: f64 = -1.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SsrUniforms {
    pub projection: Mat4,
    pub inverse_projection: Mat4,
    pub screen_size: Vec2,
    /// View-space length of the marched ray.
    pub max_distance: f32,
    /// Depth tolerance for accepting a hit.
    pub thickness: f32,
}

/// Screen-space reflection search over the G-buffer.
///
/// Writes, per pixel, the texel the reflected colour comes from (`-1` on a
/// miss) and a visibility weight.
pub struct SsrStage {
    _program: Rc<Program>,
    size: (u32, u32),
    texcoord: RenderTexture,
    visibility: RenderTexture,
    uniforms: UniformBlock,
    inputs: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl SsrStage {
    pub fn new(ctx: &RenderCtx<'_>, program: Rc<Program>, gbuffer: &GBufferStage) -> Result<Self, ShaderError> {
        let device = ctx.device;
        let texcoord = RenderTexture::new(device, "ssr texcoord", ctx.size, TEXCOORD_FORMAT);
        let visibility = RenderTexture::new(device, "ssr visibility", ctx.size, VISIBILITY_FORMAT);
        let uniforms = UniformBlock::new::<SsrUniforms>(device, "ssr");

        let layout = InputLayout::new(device, &program)?;
        let mut binder = layout.binder(&program);
        gbuffer.bind_as_input(&mut binder);
        let inputs = binder.finish(device, &layout)?;

        let pipeline = build_pipeline(
            device,
            &PipelineDesc {
                pass: PassId::Reflection,
                program: &program,
                bind_group_layouts: &[uniforms.layout(), layout.layout()],
                vertex_buffers: &[],
                color_targets: &[Some(TEXCOORD_FORMAT.into()), Some(VISIBILITY_FORMAT.into())],
            },
        )?;

        Ok(Self {
            _program: program,
            size: ctx.size,
            texcoord,
            visibility,
            uniforms,
            inputs,
            pipeline,
        })
    }

    pub fn update(&self, queue: &wgpu::Queue, uniforms: &SsrUniforms) {
        self.uniforms.write(queue, uniforms);
    }

    /// Clears texel coordinates to the miss sentinel and visibility to 0,
    /// then opens the pass with inputs bound.
    pub fn begin<'e, 'r>(
        &'r self,
        encoder: &'e mut wgpu::CommandEncoder,
        timer: Option<&GpuTimer>,
    ) -> PassBinder<'e, 'r> {
        let miss = wgpu::Color {
            r: MISS,
            g: MISS,
            b: MISS,
            a: MISS,
        };
        let mut pass = open_pass(
            encoder,
            PassId::Reflection,
            &[
                clear_color(self.texcoord.view(), miss),
                clear_color(self.visibility.view(), wgpu::Color::TRANSPARENT),
            ],
            None,
            self.size,
            timer,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(UNIFORM_GROUP, self.uniforms.bind_group());
        pass.set_bind_group(INPUT_GROUP, &self.inputs);
        pass
    }

    /// Runs the pass. When `enabled` is false only the clear happens, so the
    /// composite sees "no reflection" everywhere.
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, timer: Option<&GpuTimer>, enabled: bool) {
        let mut pass = self.begin(encoder, timer);
        if enabled {
            pass.draw(FULLSCREEN_VERTICES);
        }
        pass.end();
    }

    /// Offers the texel-coordinate and visibility textures.
    pub fn bind_as_input<'r>(&'r self, binder: &mut InputBinder<'r>) {
        binder.offer(Slot::SsrTexcoordTexture, self.texcoord.binding());
        binder.offer(Slot::SsrVisibilityTexture, self.visibility.binding());
    }
}
