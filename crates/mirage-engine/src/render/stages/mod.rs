//! The five frame passes.
//!
//! Each stage owns its render targets and pipeline, opens its pass with
//! `begin` (clearing targets to their sentinels) and offers its outputs to
//! later passes through `bind_as_input`. Targets are sized once; resizing
//! is not supported.

mod composite;
mod gbuffer;
mod resolve;
mod shadow;
mod ssr;

pub use composite::{CompositeStage, CompositeUniforms};
pub use gbuffer::{GBufferParams, GBufferStage, GeometryUniforms};
pub use resolve::{ResolveStage, ResolveUniforms};
pub use shadow::ShadowStage;
pub use ssr::{SsrStage, SsrUniforms};

use crate::mesh::Mesh;

use super::binding::PassBinder;

/// Draws an uploaded mesh in a geometry pass.
pub fn draw_mesh<'r>(pass: &mut PassBinder<'_, 'r>, mesh: &'r Mesh) {
    if mesh.index_count() == 0 {
        return;
    }
    pass.set_vertex_buffer(mesh.vertex_buffer());
    pass.set_index_buffer(mesh.index_buffer());
    pass.draw_indexed(0..mesh.index_count());
}

/// Vertices of the full-screen triangle emitted by `fullscreen.vert`.
pub(crate) const FULLSCREEN_VERTICES: std::ops::Range<u32> = 0..3;
