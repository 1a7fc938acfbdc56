use std::path::Path;
use std::rc::Rc;

use mirage_shader::{ResolvedShader, Resolver, ShaderKind, SourceLoader};

use super::compile::{compile_unit, ShaderUnit};
use super::error::ShaderError;
use super::program::Program;
use crate::resources::{CacheError, ResourceCache};

/// File suffixes compiled as shader units. The suffix gives the expected
/// kind; a `#type` directive naming another kind is an error.
pub const SHADER_EXTENSIONS: [&str; 4] = ["vert", "frag", "geom", "wgsl"];

/// Installs the shader-unit loader for every [`SHADER_EXTENSIONS`] suffix.
pub fn register_shader_loaders(cache: &mut ResourceCache<wgpu::Device>) {
    for ext in SHADER_EXTENSIONS {
        cache.register_loader(ext, load_unit);
    }
}

fn load_unit(device: &wgpu::Device, path: &Path) -> Result<ShaderUnit, ShaderError> {
    let resolved = resolve_unit(&Resolver::new(), path)?;
    compile_unit(device, &resolved)
}

fn resolve_unit<L: SourceLoader>(resolver: &Resolver<L>, path: &Path) -> Result<ResolvedShader, ShaderError> {
    Ok(resolver.resolve(path, ShaderKind::from_path(path))?)
}

/// Loads (or fetches) each unit in `paths` and links them into a program
/// cached under the whole path list.
pub fn load_program<P: AsRef<Path>>(
    cache: &mut ResourceCache<wgpu::Device>,
    device: &wgpu::Device,
    paths: &[P],
) -> Result<Rc<Program>, CacheError> {
    cache.load_linked(device, paths, |_, units: Vec<Rc<ShaderUnit>>| Program::link(units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::compile::tests::MemoryLoader;
    use mirage_shader::ResolveErrorKind;

    #[test]
    fn suffix_sets_the_expected_kind() {
        let loader = MemoryLoader::default().with("s/a.frag", "x\n");
        let unit = resolve_unit(&Resolver::with_loader(loader), Path::new("s/a.frag")).unwrap();
        assert_eq!(unit.kind, ShaderKind::Fragment);
    }

    #[test]
    fn directive_conflicting_with_suffix_fails() {
        let loader = MemoryLoader::default().with("s/a.vert", "#type fragment\nx\n");
        let err = resolve_unit(&Resolver::with_loader(loader), Path::new("s/a.vert")).unwrap_err();
        match err {
            ShaderError::Resolve(err) => assert!(matches!(
                err.kind,
                ResolveErrorKind::ConflictingKind {
                    declared: ShaderKind::Vertex,
                    found: ShaderKind::Fragment,
                    ..
                }
            )),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn neutral_suffix_takes_the_directive() {
        let loader = MemoryLoader::default().with("lib.wgsl", "#type vertex\nx\n");
        let unit = resolve_unit(&Resolver::with_loader(loader), Path::new("lib.wgsl")).unwrap();
        assert_eq!(unit.kind, ShaderKind::Vertex);
    }
}
