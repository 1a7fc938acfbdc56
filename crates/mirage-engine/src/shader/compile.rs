use std::borrow::Cow;

use mirage_shader::{ResolvedShader, ShaderKind};

use super::error::{ShaderError, SourceLine};

/// A resource variable declared by a shader (`@group(g) @binding(b) var name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalBinding {
    pub name: String,
    pub group: u32,
    pub binding: u32,
}

/// What the renderer needs to know about a validated module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reflection {
    /// First entry point of the unit's stage, if any.
    pub entry_point: Option<String>,
    pub globals: Vec<GlobalBinding>,
}

/// One compiled shader stage.
#[derive(Debug)]
pub struct ShaderUnit {
    pub name: String,
    pub kind: ShaderKind,
    pub reflection: Reflection,
    module: wgpu::ShaderModule,
}

impl ShaderUnit {
    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    pub fn entry_point(&self) -> Option<&str> {
        self.reflection.entry_point.as_deref()
    }
}

fn naga_stage(kind: ShaderKind) -> Option<naga::ShaderStage> {
    match kind {
        ShaderKind::Vertex => Some(naga::ShaderStage::Vertex),
        ShaderKind::Fragment => Some(naga::ShaderStage::Fragment),
        ShaderKind::Geometry | ShaderKind::Unknown => None,
    }
}

/// Parses and validates resolved WGSL, mapping diagnostics back to the
/// physical file and line they came from.
pub fn analyze(shader: &ResolvedShader) -> Result<Reflection, ShaderError> {
    let Some(stage) = naga_stage(shader.kind) else {
        return Err(ShaderError::UnsupportedKind {
            name: shader.name.clone(),
            kind: shader.kind,
        });
    };

    let module = naga::front::wgsl::parse_str(&shader.source).map_err(|err| {
        let line = err.location(&shader.source).map(|l| l.line_number);
        compile_error(shader, line, err.message().to_string())
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator.validate(&module).map_err(|err| {
        let line = err.location(&shader.source).map(|l| l.line_number);
        compile_error(shader, line, err.as_inner().to_string())
    })?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage)
        .map(|ep| ep.name.clone());

    let globals = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            let name = var.name.as_ref()?;
            let rb = var.binding.as_ref()?;
            Some(GlobalBinding {
                name: name.clone(),
                group: rb.group,
                binding: rb.binding,
            })
        })
        .collect();

    Ok(Reflection {
        entry_point,
        globals,
    })
}

fn compile_error(shader: &ResolvedShader, line: Option<u32>, message: String) -> ShaderError {
    let location = line.and_then(|l| shader.locate(l)).map(|(path, line)| SourceLine {
        path: path.to_path_buf(),
        line,
    });
    ShaderError::Compile {
        name: shader.name.clone(),
        location,
        message,
    }
}

/// Validates `shader` and creates its GPU module, labelled with the shader's name.
pub fn compile_unit(device: &wgpu::Device, shader: &ResolvedShader) -> Result<ShaderUnit, ShaderError> {
    let reflection = analyze(shader)?;

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&shader.name),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&shader.source)),
    });

    log::debug!(
        "compiled {} shader `{}` ({} lines, {} bindings)",
        shader.kind,
        shader.name,
        shader.line_count(),
        reflection.globals.len()
    );

    Ok(ShaderUnit {
        name: shader.name.clone(),
        kind: shader.kind,
        reflection,
        module,
    })
}
