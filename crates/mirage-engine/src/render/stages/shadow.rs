use std::rc::Rc;

use glam::Mat4;

use crate::mesh::MeshVertex;
use crate::render::binding::{InputBinder, PassBinder, UniformBlock, UNIFORM_GROUP};
use crate::render::pipeline::{build_pipeline, open_pass, PipelineDesc};
use crate::render::target::{clear_depth, RenderTexture, DEPTH_FORMAT};
use crate::render::{PassId, RenderCtx, Slot};
use crate::shader::{Program, ShaderError};
use crate::timing::GpuTimer;

use super::gbuffer::GeometryUniforms;

/// Depth-only pass from the light's point of view.
///
/// Reuses the geometry vertex shader with an identity view matrix and the
/// light's projection.
pub struct ShadowStage {
    _program: Rc<Program>,
    resolution: u32,
    map: RenderTexture,
    sampler: wgpu::Sampler,
    uniforms: UniformBlock,
    pipeline: wgpu::RenderPipeline,
}

impl ShadowStage {
    /// `resolution` is the side of the square shadow map in texels.
    pub fn new(ctx: &RenderCtx<'_>, program: Rc<Program>, resolution: u32) -> Result<Self, ShaderError> {
        let device = ctx.device;
        let map = RenderTexture::new(device, "shadow map", (resolution, resolution), DEPTH_FORMAT);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let uniforms = UniformBlock::new::<GeometryUniforms>(device, "shadow");
        let pipeline = build_pipeline(
            device,
            &PipelineDesc {
                pass: PassId::Shadow,
                program: &program,
                bind_group_layouts: &[uniforms.layout()],
                vertex_buffers: &[MeshVertex::layout()],
                color_targets: &[],
            },
        )?;

        log::info!("shadow map {resolution}x{resolution}");
        Ok(Self {
            _program: program,
            resolution,
            map,
            sampler,
            uniforms,
            pipeline,
        })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn update(&self, queue: &wgpu::Queue, shadow_projection: Mat4) {
        self.uniforms.write(
            queue,
            &GeometryUniforms {
                projection: shadow_projection,
                view: Mat4::IDENTITY,
            },
        );
    }

    /// Clears the map to the far plane and opens the depth-only pass.
    pub fn begin<'e, 'r>(
        &'r self,
        encoder: &'e mut wgpu::CommandEncoder,
        timer: Option<&GpuTimer>,
    ) -> PassBinder<'e, 'r> {
        let mut pass = open_pass(
            encoder,
            PassId::Shadow,
            &[],
            Some(clear_depth(self.map.view())),
            (self.resolution, self.resolution),
            timer,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(UNIFORM_GROUP, self.uniforms.bind_group());
        pass
    }

    /// Offers the shadow map and its comparison sampler.
    pub fn bind_as_input<'r>(&'r self, binder: &mut InputBinder<'r>) {
        binder.offer(Slot::ShadowMap, self.map.binding());
        binder.offer(Slot::ShadowSampler, wgpu::BindingResource::Sampler(&self.sampler));
    }
}
