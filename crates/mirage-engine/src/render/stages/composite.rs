use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::render::binding::{InputLayout, PassBinder, UniformBlock, INPUT_GROUP, UNIFORM_GROUP};
use crate::render::pipeline::{build_pipeline, open_pass, PipelineDesc};
use crate::render::target::{clear_color, SharedSamplers};
use crate::render::{PassId, RenderCtx};
use crate::shader::{Program, ShaderError};
use crate::timing::GpuTimer;

use super::resolve::ResolveStage;
use super::ssr::SsrStage;
use super::FULLSCREEN_VERTICES;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CompositeUniforms {
    /// Scale applied to the reflected colour.
    pub reflection_strength: f32,
    pub _pad: [f32; 3],
}

impl Default for CompositeUniforms {
    fn default() -> Self {
        Self {
            reflection_strength: 1.0,
            _pad: [0.0; 3],
        }
    }
}

/// Final combine of the lit image and its reflections into the surface.
pub struct CompositeStage {
    _program: Rc<Program>,
    size: (u32, u32),
    uniforms: UniformBlock,
    inputs: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl CompositeStage {
    pub fn new(
        ctx: &RenderCtx<'_>,
        program: Rc<Program>,
        resolve: &ResolveStage,
        ssr: &SsrStage,
        samplers: &SharedSamplers,
    ) -> Result<Self, ShaderError> {
        let device = ctx.device;
        let uniforms = UniformBlock::new::<CompositeUniforms>(device, "composite");
        uniforms.write(ctx.queue, &CompositeUniforms::default());

        let layout = InputLayout::new(device, &program)?;
        let mut binder = layout.binder(&program);
        resolve.bind_as_input(&mut binder);
        ssr.bind_as_input(&mut binder);
        samplers.bind_as_input(&mut binder);
        let inputs = binder.finish(device, &layout)?;

        let pipeline = build_pipeline(
            device,
            &PipelineDesc {
                pass: PassId::Composite,
                program: &program,
                bind_group_layouts: &[uniforms.layout(), layout.layout()],
                vertex_buffers: &[],
                color_targets: &[Some(ctx.surface_format.into())],
            },
        )?;

        Ok(Self {
            _program: program,
            size: ctx.size,
            uniforms,
            inputs,
            pipeline,
        })
    }

    pub fn update(&self, queue: &wgpu::Queue, uniforms: &CompositeUniforms) {
        self.uniforms.write(queue, uniforms);
    }

    /// Clears the surface to 0 and opens the pass with inputs bound.
    pub fn begin<'e, 'r>(
        &'r self,
        encoder: &'e mut wgpu::CommandEncoder,
        surface: &wgpu::TextureView,
        timer: Option<&GpuTimer>,
    ) -> PassBinder<'e, 'r> {
        let mut pass = open_pass(
            encoder,
            PassId::Composite,
            &[clear_color(surface, wgpu::Color::BLACK)],
            None,
            self.size,
            timer,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(UNIFORM_GROUP, self.uniforms.bind_group());
        pass.set_bind_group(INPUT_GROUP, &self.inputs);
        pass
    }

    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, surface: &wgpu::TextureView, timer: Option<&GpuTimer>) {
        let mut pass = self.begin(encoder, surface, timer);
        pass.draw(FULLSCREEN_VERTICES);
        pass.end();
    }
}
