use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::builder::{MeshBuilder, MeshValidationError};

// ── vertex ────────────────────────────────────────────────────────────────

/// Interleaved vertex consumed by the geometry and shadow pipelines.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 4],
    pub normal: [f32; 3],
    pub color: [u8; 4], // unorm
    pub shininess: f32,
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x4,
        1 => Float32x3,
        2 => Unorm8x4,
        3 => Float32,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Interleaves a builder's attributes. Missing attributes read as zero;
/// plain positions get `w = 1`.
pub fn interleave(builder: &MeshBuilder) -> Result<Vec<MeshVertex>, MeshValidationError> {
    let n = builder.validate()?;
    let vertices = (0..n)
        .map(|i| MeshVertex {
            position: match builder.positions_h.get(i) {
                Some(p) => p.to_array(),
                None => builder
                    .positions
                    .get(i)
                    .map_or([0.0, 0.0, 0.0, 1.0], |p| p.extend(1.0).to_array()),
            },
            normal: builder.normals.get(i).map_or([0.0; 3], |n| n.to_array()),
            color: builder.colors.get(i).copied().unwrap_or([0; 4]),
            shininess: builder.shininess.get(i).copied().unwrap_or(0.0),
        })
        .collect();
    Ok(vertices)
}

// ── Mesh ──────────────────────────────────────────────────────────────────

/// Indexed triangle list in GPU buffers.
#[derive(Debug)]
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, label: &str, builder: &MeshBuilder) -> Result<Self, MeshValidationError> {
        let vertices = interleave(builder)?;
        let indices = builder.draw_indices();

        // Zero-sized buffers are not allowed; an empty mesh keeps one dummy
        // element and draws nothing.
        let vertex_bytes: &[u8] = if vertices.is_empty() {
            bytemuck::bytes_of(&ZERO_VERTEX)
        } else {
            bytemuck::cast_slice(&vertices)
        };
        let index_bytes: &[u8] = if indices.is_empty() {
            bytemuck::bytes_of(&0u32)
        } else {
            bytemuck::cast_slice(&indices)
        };

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: index_bytes,
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "uploaded mesh `{label}`: {} vertices, {} indices",
            vertices.len(),
            indices.len()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

const ZERO_VERTEX: MeshVertex = MeshVertex {
    position: [0.0; 4],
    normal: [0.0; 3],
    color: [0; 4],
    shininess: 0.0,
};

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 36);
        assert_eq!(MeshVertex::layout().attributes[3].offset, 32);
    }

    #[test]
    fn interleave_promotes_and_zero_fills() {
        let b = MeshBuilder {
            positions: vec![Vec3::new(1.0, 2.0, 3.0)],
            colors: vec![[9, 8, 7, 6]],
            ..Default::default()
        };
        let v = interleave(&b).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(v[0].normal, [0.0; 3]);
        assert_eq!(v[0].color, [9, 8, 7, 6]);

        let h = MeshBuilder {
            positions_h: vec![Vec4::new(1.0, 1.0, 1.0, 0.0)],
            ..Default::default()
        };
        assert_eq!(interleave(&h).unwrap()[0].position, [1.0, 1.0, 1.0, 0.0]);
    }
}
