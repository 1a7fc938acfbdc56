use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::mesh::MeshVertex;
use crate::render::binding::{InputBinder, PassBinder, UniformBlock, UNIFORM_GROUP};
use crate::render::pipeline::{build_pipeline, open_pass, PipelineDesc};
use crate::render::target::{clear_color, clear_depth, RenderTexture, DEPTH_FORMAT};
use crate::render::{PassId, RenderCtx, Slot};
use crate::shader::{Program, ShaderError};
use crate::timing::GpuTimer;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;
const SPECULAR_SHININESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;

/// Camera matrices of a geometry or shadow pass.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct GeometryUniforms {
    pub projection: Mat4,
    pub view: Mat4,
}

/// What a program reading the G-buffer needs besides its textures.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GBufferParams {
    pub screen_size: Vec2,
    pub inverse_projection: Mat4,
}

/// Geometry pass: per-pixel colour, depth, normal and specular/shininess.
pub struct GBufferStage {
    _program: Rc<Program>,
    size: (u32, u32),
    color: RenderTexture,
    depth: RenderTexture,
    normal: RenderTexture,
    specular_shininess: RenderTexture,
    uniforms: UniformBlock,
    pipeline: wgpu::RenderPipeline,
}

impl GBufferStage {
    pub fn new(ctx: &RenderCtx<'_>, program: Rc<Program>) -> Result<Self, ShaderError> {
        let device = ctx.device;
        let size = ctx.size;

        let color = RenderTexture::new(device, "gbuffer color", size, COLOR_FORMAT);
        let depth = RenderTexture::new(device, "gbuffer depth", size, DEPTH_FORMAT);
        let normal = RenderTexture::new(device, "gbuffer normal", size, NORMAL_FORMAT);
        let specular_shininess = RenderTexture::new(
            device,
            "gbuffer specular/shininess",
            size,
            SPECULAR_SHININESS_FORMAT,
        );

        let uniforms = UniformBlock::new::<GeometryUniforms>(device, "gbuffer");
        let target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        };
        let pipeline = build_pipeline(
            device,
            &PipelineDesc {
                pass: PassId::Geometry,
                program: &program,
                bind_group_layouts: &[uniforms.layout()],
                vertex_buffers: &[MeshVertex::layout()],
                color_targets: &[
                    target(COLOR_FORMAT),
                    target(NORMAL_FORMAT),
                    target(SPECULAR_SHININESS_FORMAT),
                ],
            },
        )?;

        Ok(Self {
            _program: program,
            size,
            color,
            depth,
            normal,
            specular_shininess,
            uniforms,
            pipeline,
        })
    }

    pub fn update(&self, queue: &wgpu::Queue, projection: Mat4, view: Mat4) {
        self.uniforms.write(queue, &GeometryUniforms { projection, view });
    }

    /// Clears every target (colour 0, depth 1) and opens the pass with the
    /// geometry pipeline bound. Draw meshes into the returned pass; dropping
    /// it ends the pass.
    pub fn begin<'e, 'r>(
        &'r self,
        encoder: &'e mut wgpu::CommandEncoder,
        timer: Option<&GpuTimer>,
    ) -> PassBinder<'e, 'r> {
        let transparent = wgpu::Color::TRANSPARENT;
        let mut pass = open_pass(
            encoder,
            PassId::Geometry,
            &[
                clear_color(self.color.view(), transparent),
                clear_color(self.normal.view(), transparent),
                clear_color(self.specular_shininess.view(), transparent),
            ],
            Some(clear_depth(self.depth.view())),
            self.size,
            timer,
        );
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(UNIFORM_GROUP, self.uniforms.bind_group());
        pass
    }

    /// Offers the four G-buffer textures.
    pub fn bind_as_input<'r>(&'r self, binder: &mut InputBinder<'r>) {
        binder.offer(Slot::ColorTexture, self.color.binding());
        binder.offer(Slot::DepthTexture, self.depth.binding());
        binder.offer(Slot::NormalTexture, self.normal.binding());
        binder.offer(Slot::SpecularShininessTexture, self.specular_shininess.binding());
    }

    pub fn params(&self, projection: Mat4) -> GBufferParams {
        GBufferParams {
            screen_size: Vec2::new(self.size.0 as f32, self.size.1 as f32),
            inverse_projection: projection.inverse(),
        }
    }
}
