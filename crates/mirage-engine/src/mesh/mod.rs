//! CPU mesh construction and GPU upload.

mod builder;
mod gpu;
pub mod shapes;

pub use builder::{MeshBuilder, MeshValidationError};
pub use gpu::{interleave, Mesh, MeshVertex};
