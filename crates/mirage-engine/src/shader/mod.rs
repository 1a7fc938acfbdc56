//! Shader units and programs.
//!
//! Units are resolved by `mirage-shader`, validated with naga (so compiler
//! diagnostics point at physical source lines) and turned into wgpu modules.
//! Programs link a vertex and a fragment unit and expose the merged resource
//! declarations for binding by name.

mod compile;
mod error;
mod loaders;
mod program;

pub use compile::{analyze, compile_unit, GlobalBinding, Reflection, ShaderUnit};
pub use error::{ShaderError, SourceLine};
pub use loaders::{load_program, register_shader_loaders, SHADER_EXTENSIONS};
pub use program::Program;
