use std::collections::HashMap;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use fontdue::layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle};
use glam::Vec2;

use crate::render::RenderCtx;

use super::layout::Rect;

// ── atlas constants ────────────────────────────────────────────────────────

const ATLAS_SIZE: u32 = 1024;
const GLYPH_PADDING: u32 = 1; // pixels between glyphs in the atlas
/// Fully covered block at the atlas origin, sampled by solid quads.
const SOLID_BLOCK: u32 = 2;

const VERTICES_PER_QUAD: u32 = 6;

struct CachedGlyph {
    uv_min: [f32; 2],
    uv_max: [f32; 2],
}

/// One textured quad (48 bytes):
///
///  offset  0  dst_min  [f32; 2]   loc 0
///  offset  8  dst_max  [f32; 2]   loc 1
///  offset 16  uv_min   [f32; 2]   loc 2
///  offset 24  uv_max   [f32; 2]   loc 3
///  offset 32  color    [f32; 4]   loc 4
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadInstance {
    dst_min: [f32; 2],
    dst_max: [f32; 2],
    uv_min: [f32; 2],
    uv_max: [f32; 2],
    color: [f32; 4],
}

impl QuadInstance {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x2, // dst_min
        1 => Float32x2, // dst_max
        2 => Float32x2, // uv_min
        3 => Float32x2, // uv_max
        4 => Float32x4  // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    viewport: [f32; 2],
    _pad: [f32; 2],
}

/// Draws solid rectangles and text from a glyph atlas on top of the frame.
///
/// Glyphs are rasterized on first use and kept for the renderer's lifetime,
/// keyed by [`GlyphRasterConfig`] (glyph index and pixel size).
pub struct TextRenderer {
    font: fontdue::Font,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    viewport_ubo: wgpu::Buffer,
    atlas: wgpu::Texture,
    atlas_cursor_x: u32,
    atlas_cursor_y: u32,
    atlas_row_height: u32,
    atlas_full: bool,
    glyph_cache: HashMap<GlyphRasterConfig, CachedGlyph>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
    instances: Vec<QuadInstance>,
    layout: Layout<()>,
}

impl TextRenderer {
    pub fn new(ctx: &RenderCtx<'_>, font: fontdue::Font) -> Self {
        let device = ctx.device;

        let atlas = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("overlay atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let atlas_view = atlas.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("overlay sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("overlay viewport"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(std::mem::size_of::<ViewportUniform>() as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay bind group"),
            layout: &bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: viewport_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let renderer = Self {
            font,
            pipeline,
            bind_group,
            viewport_ubo,
            atlas,
            atlas_cursor_x: SOLID_BLOCK + GLYPH_PADDING,
            atlas_cursor_y: GLYPH_PADDING,
            atlas_row_height: SOLID_BLOCK,
            atlas_full: false,
            glyph_cache: HashMap::new(),
            instance_vbo: None,
            instance_capacity: 0,
            instances: Vec::new(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        };
        renderer.write_solid_block(ctx.queue);
        renderer
    }

    /// Height of one line of text at `size` pixels.
    pub fn line_height(&self, size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(size)
            .map_or(size * 1.2, |m| m.new_line_size)
    }

    /// Advance width of `text` laid out on one line.
    pub fn measure(&mut self, text: &str, size: f32) -> f32 {
        self.layout.reset(&LayoutSettings::default());
        self.layout.append(&[&self.font], &TextStyle::new(text, size, 0));
        self.layout
            .glyphs()
            .iter()
            .map(|g| {
                let m = self.font.metrics_indexed(g.key.glyph_index, size);
                g.x - m.xmin as f32 + m.advance_width
            })
            .fold(0.0, f32::max)
    }

    // ── frame building ─────────────────────────────────────────────────────

    pub fn push_rect(&mut self, rect: Rect, color: [f32; 4]) {
        let uv = (SOLID_BLOCK as f32 * 0.5) / ATLAS_SIZE as f32;
        self.instances.push(QuadInstance {
            dst_min: rect.min.to_array(),
            dst_max: rect.max.to_array(),
            uv_min: [uv, uv],
            uv_max: [uv, uv],
            color,
        });
    }

    pub fn push_text(&mut self, queue: &wgpu::Queue, origin: Vec2, text: &str, size: f32, color: [f32; 4]) {
        self.layout.reset(&LayoutSettings {
            x: origin.x,
            y: origin.y,
            ..LayoutSettings::default()
        });
        self.layout.append(&[&self.font], &TextStyle::new(text, size, 0));

        // Snapshot glyph positions so the borrow on `self.layout` ends before
        // glyphs are placed in the atlas.
        let glyphs: Vec<(GlyphRasterConfig, f32, f32, usize, usize)> = self
            .layout
            .glyphs()
            .iter()
            .filter(|g| g.char_data.rasterize() && g.width > 0 && g.height > 0)
            .map(|g| (g.key, g.x, g.y, g.width, g.height))
            .collect();

        for (key, x, y, w, h) in glyphs {
            if !self.glyph_cache.contains_key(&key) {
                let (metrics, bitmap) = self.font.rasterize_config(key);
                if metrics.width == 0 || metrics.height == 0 {
                    continue;
                }
                if let Some(entry) = self.place_glyph(queue, &bitmap, metrics.width as u32, metrics.height as u32) {
                    self.glyph_cache.insert(key, entry);
                }
            }
            let Some(cached) = self.glyph_cache.get(&key) else {
                continue;
            };
            self.instances.push(QuadInstance {
                dst_min: [x, y],
                dst_max: [x + w as f32, y + h as f32],
                uv_min: cached.uv_min,
                uv_max: cached.uv_max,
                color,
            });
        }
    }

    /// Draws everything pushed since the last call over `target`.
    pub fn flush(&mut self, ctx: &RenderCtx<'_>, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        if self.instances.is_empty() {
            return;
        }
        let [w, h] = ctx.screen_size();
        ctx.queue.write_buffer(
            &self.viewport_ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform {
                viewport: [w.max(1.0), h.max(1.0)],
                _pad: [0.0; 2],
            }),
        );

        self.ensure_instance_capacity(ctx.device, self.instances.len());
        let Some(instance_vbo) = self.instance_vbo.as_ref() else {
            return;
        };
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&self.instances));

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("overlay pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, instance_vbo.slice(..));
        rpass.draw(0..VERTICES_PER_QUAD, 0..self.instances.len() as u32);
        drop(rpass);

        self.instances.clear();
    }

    // ── atlas helpers ──────────────────────────────────────────────────────

    fn write_solid_block(&self, queue: &wgpu::Queue) {
        let texels = [u8::MAX; (SOLID_BLOCK * SOLID_BLOCK) as usize];
        self.upload(queue, 0, 0, SOLID_BLOCK, SOLID_BLOCK, &texels);
    }

    fn upload(&self, queue: &wgpu::Queue, x: u32, y: u32, w: u32, h: u32, texels: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.atlas,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            texels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
    }

    fn place_glyph(&mut self, queue: &wgpu::Queue, bitmap: &[u8], w: u32, h: u32) -> Option<CachedGlyph> {
        if self.atlas_full {
            return None;
        }

        // New shelf when the glyph doesn't fit horizontally.
        if self.atlas_cursor_x + w + GLYPH_PADDING > ATLAS_SIZE {
            self.atlas_cursor_y += self.atlas_row_height + GLYPH_PADDING;
            self.atlas_cursor_x = GLYPH_PADDING;
            self.atlas_row_height = 0;
        }
        if self.atlas_cursor_y + h + GLYPH_PADDING > ATLAS_SIZE {
            log::warn!("overlay glyph atlas is full ({ATLAS_SIZE}x{ATLAS_SIZE}); some glyphs will be missing");
            self.atlas_full = true;
            return None;
        }

        let (gx, gy) = (self.atlas_cursor_x, self.atlas_cursor_y);
        self.upload(queue, gx, gy, w, h, bitmap);
        self.atlas_cursor_x += w + GLYPH_PADDING;
        self.atlas_row_height = self.atlas_row_height.max(h);

        let size = ATLAS_SIZE as f32;
        Some(CachedGlyph {
            uv_min: [gx as f32 / size, gy as f32 / size],
            uv_max: [(gx + w) as f32 / size, (gy + h) as f32 / size],
        })
    }

    fn ensure_instance_capacity(&mut self, device: &wgpu::Device, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let capacity = required.next_power_of_two().max(64);
        self.instance_vbo = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("overlay instances"),
            size: (capacity * std::mem::size_of::<QuadInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = capacity;
    }
}
