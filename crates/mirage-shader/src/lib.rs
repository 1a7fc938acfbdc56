//! Shader source resolution for the **Mirage** renderer.
//!
//! Shader files are plain WGSL text extended with two line directives:
//!
//! | Directive | Effect |
//! |-----------|--------|
//! | `#type vertex\|geometry\|fragment` | declares the stage of the whole resolved blob; replaced by a blank line |
//! | `#include "relative/path"` | splices the named file, resolved against the including file's directory |
//!
//! The resolver flattens a root file into a single source string and keeps a
//! per-line origin table so compiler diagnostics against the flattened text can
//! be mapped back to the physical file and line.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`kind`] | `ShaderKind` |
//! | [`directive`] | line classification (`Line`) |
//! | [`loader`] | `SourceLoader`, `FsLoader`, path normalization |
//! | [`resolver`] | `Resolver`, `ResolvedShader`, `LineOrigin` |
//! | [`error`] | `ResolveError`, `ResolveErrorKind` |
//!
//! # Quick start
//!
//! ```no_run
//! use mirage_shader::{resolve_file, ShaderKind};
//!
//! let shader = resolve_file("shaders/gbuffer.vert", ShaderKind::Unknown).unwrap();
//! println!("{} ({}): {} lines", shader.name, shader.kind, shader.line_count());
//! ```

pub mod directive;
pub mod error;
pub mod kind;
pub mod loader;
pub mod resolver;

pub use error::{ResolveError, ResolveErrorKind};
pub use kind::ShaderKind;
pub use loader::{normalize_path, FsLoader, SourceLoader};
pub use resolver::{resolve_file, LineOrigin, ResolvedShader, Resolver, MAX_INCLUDE_DEPTH};
