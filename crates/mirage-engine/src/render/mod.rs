//! Deferred rendering passes.
//!
//! A frame is five passes in fixed order ([`PassId::ALL`]). Outputs of earlier
//! passes reach later ones through the input bind group, whose binding
//! indices are fixed per [`Slot`]:
//!
//! | Pass | Outputs | Bindings |
//! |------|---------|----------|
//! | Resolve | resolve texture | 0 |
//! | Geometry | colour, depth, normal, specular/shininess | 1–4 |
//! | Shadow | shadow map, comparison sampler | 5–6 |
//! | Reflection | texel coordinates, visibility | 7–8 |
//! | (shared) | linear sampler | 9 |

pub mod binding;
mod ctx;
mod pass;
pub mod pipeline;
pub mod stages;
pub mod target;

pub use binding::{InputBinder, InputLayout, PassBinder, UniformBlock, INPUT_GROUP, UNIFORM_GROUP};
pub use ctx::RenderCtx;
pub use pass::{PassId, Slot};
pub use target::{RenderTexture, SharedSamplers};
