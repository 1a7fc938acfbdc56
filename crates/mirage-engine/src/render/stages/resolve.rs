use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec4};

use crate::render::binding::{InputBinder, InputLayout, PassBinder, UniformBlock, INPUT_GROUP, UNIFORM_GROUP};
use crate::render::pipeline::{build_pipeline, open_pass, PipelineDesc};
use crate::render::target::{clear_color, RenderTexture, SharedSamplers};
use crate::render::{PassId, RenderCtx, Slot};
use crate::shader::{Program, ShaderError};
use crate::timing::GpuTimer;

use super::gbuffer::GBufferStage;
use super::shadow::ShadowStage;
use super::FULLSCREEN_VERTICES;

const RESOLVE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ResolveUniforms {
    pub inverse_projection: Mat4,
    pub inv_view_shadow_view_projection: Mat4,
    /// View space, pointing from the light into the scene.
    pub light_direction: Vec4,
    pub light_color: Vec4,
    pub screen_size: Vec2,
    pub shadow_texel: Vec2,
}

/// Lighting resolution: shades the G-buffer with the directional light and
/// its shadow map into a colour texture.
pub struct ResolveStage {
    _program: Rc<Program>,
    size: (u32, u32),
    target: RenderTexture,
    uniforms: UniformBlock,
    inputs: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl ResolveStage {
    pub fn new(
        ctx: &RenderCtx<'_>,
        program: Rc<Program>,
        gbuffer: &GBufferStage,
        shadow: &ShadowStage,
        samplers: &SharedSamplers,
    ) -> Result<Self, ShaderError> {
        let device = ctx.device;
        let target = RenderTexture::new(device, "resolve", ctx.size, RESOLVE_FORMAT);
        let uniforms = UniformBlock::new::<ResolveUniforms>(device, "resolve");

        let layout = InputLayout::new(device, &program)?;
        let mut binder = layout.binder(&program);
        gbuffer.bind_as_input(&mut binder);
        shadow.bind_as_input(&mut binder);
        samplers.bind_as_input(&mut binder);
        let inputs = binder.finish(device, &layout)?;

        let pipeline = build_pipeline(
            device,
            &PipelineDesc {
                pass: PassId::Resolve,
                program: &program,
                bind_group_layouts: &[uniforms.layout(), layout.layout()],
                vertex_buffers: &[],
                color_targets: &[Some(RESOLVE_FORMAT.into())],
            },
        )?;

        Ok(Self {
            _program: program,
            size: ctx.size,
            target,
            uniforms,
            inputs,
            pipeline,
        })
    }

    pub fn update(&self, queue: &wgpu::Queue, uniforms: &ResolveUniforms) {
        self.uniforms.write(queue, uniforms);
    }

    /// Clears the target to 0 and opens the pass with inputs bound.
    pub fn begin<'e, 'r>(
        &'r self,
        encoder: &'e mut wgpu::CommandEncoder,
        timer: Option<&GpuTimer>,
    ) -> PassBinder<'e, 'r> {
        let mut pass = open_pass(
            encoder,
            PassId::Resolve,
            &[clear_color(self.target.view(), wgpu::Color::TRANSPARENT)],
            None,
            self.size,
            timer,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(UNIFORM_GROUP, self.uniforms.bind_group());
        pass.set_bind_group(INPUT_GROUP, &self.inputs);
        pass
    }

    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, timer: Option<&GpuTimer>) {
        let mut pass = self.begin(encoder, timer);
        pass.draw(FULLSCREEN_VERTICES);
        pass.end();
    }

    /// Offers the shaded colour texture.
    pub fn bind_as_input<'r>(&'r self, binder: &mut InputBinder<'r>) {
        binder.offer(Slot::ResolveTexture, self.target.binding());
    }
}
