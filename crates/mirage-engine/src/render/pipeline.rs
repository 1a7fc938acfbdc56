use crate::shader::{Program, ShaderError};
use crate::timing::GpuTimer;

use super::binding::PassBinder;
use super::pass::PassId;
use super::target::DEPTH_FORMAT;

/// Inputs for building one pass's pipeline.
pub struct PipelineDesc<'a> {
    pub pass: PassId,
    pub program: &'a Program,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub color_targets: &'a [Option<wgpu::ColorTargetState>],
}

/// Builds a pipeline whose fixed-function state follows the pass table:
/// depth-tested passes cull back faces (counter-clockwise front) and test
/// with `LessEqual`; full-screen passes have no depth state.
pub fn build_pipeline(device: &wgpu::Device, desc: &PipelineDesc<'_>) -> Result<wgpu::RenderPipeline, ShaderError> {
    let program = desc.program;
    let missing_entry = |stage: &str| ShaderError::Link {
        name: program.name.clone(),
        message: format!("no {stage} entry point"),
    };

    let vertex = program.vertex();
    let vs_entry = vertex.entry_point().ok_or_else(|| missing_entry("vertex"))?;

    let label = format!("{:?} pipeline ({})", desc.pass, program.name);
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&label),
        bind_group_layouts: desc.bind_group_layouts,
        immediate_size: 0,
    });

    let fragment = match program.fragment() {
        Some(unit) => Some(wgpu::FragmentState {
            module: unit.module(),
            entry_point: Some(unit.entry_point().ok_or_else(|| missing_entry("fragment"))?),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: desc.color_targets,
        }),
        None => None,
    };

    let depth_stencil = desc.pass.uses_depth().then(|| wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: if desc.pass == PassId::Shadow {
            wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            }
        } else {
            wgpu::DepthBiasState::default()
        },
    });

    Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: vertex.module(),
            entry_point: Some(vs_entry),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: desc.vertex_buffers,
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: desc.pass.uses_depth().then_some(wgpu::Face::Back),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        fragment,
        multiview_mask: None,
        cache: None,
    }))
}

/// Opens `pass` on `encoder` with the given attachments, full-target
/// viewport, and the pass timer's timestamps if any.
pub fn open_pass<'e, 'r>(
    encoder: &'e mut wgpu::CommandEncoder,
    pass: PassId,
    color_attachments: &[Option<wgpu::RenderPassColorAttachment<'_>>],
    depth: Option<wgpu::RenderPassDepthStencilAttachment<'_>>,
    size: (u32, u32),
    timer: Option<&GpuTimer>,
) -> PassBinder<'e, 'r> {
    let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(pass.label()),
        color_attachments,
        depth_stencil_attachment: depth,
        timestamp_writes: timer.map(GpuTimer::timestamp_writes),
        occlusion_query_set: None,
        multiview_mask: None,
    });
    rp.set_viewport(0.0, 0.0, size.0 as f32, size.1 as f32, 0.0, 1.0);
    PassBinder::new(rp)
}
