use std::rc::Rc;

use mirage_shader::ShaderKind;

use super::compile::{GlobalBinding, ShaderUnit};
use super::error::ShaderError;

/// A linked vertex (+ optional fragment) pair.
///
/// Linking checks the stage entry points and merges the units' resource
/// declarations; pipelines are built from a program by the stage that uses it.
#[derive(Debug)]
pub struct Program {
    pub name: String,
    vertex: Rc<ShaderUnit>,
    fragment: Option<Rc<ShaderUnit>>,
    bindings: Vec<GlobalBinding>,
}

impl Program {
    pub fn link(units: Vec<Rc<ShaderUnit>>) -> Result<Self, ShaderError> {
        let name = units
            .iter()
            .map(|u| u.name.as_str())
            .collect::<Vec<_>>()
            .join("+");
        let fail = |message: String| ShaderError::Link {
            name: name.clone(),
            message,
        };

        let mut vertex = None;
        let mut fragment = None;
        for unit in units {
            let slot = match unit.kind {
                ShaderKind::Vertex => &mut vertex,
                ShaderKind::Fragment => &mut fragment,
                other => return Err(fail(format!("`{}` has unlinkable kind `{other}`", unit.name))),
            };
            if slot.is_some() {
                return Err(fail(format!("more than one {} unit", unit.kind)));
            }
            if unit.entry_point().is_none() {
                return Err(fail(format!("`{}` has no @{} entry point", unit.name, unit.kind)));
            }
            *slot = Some(unit);
        }

        let vertex: Rc<ShaderUnit> = vertex.ok_or_else(|| fail("no vertex unit".to_string()))?;
        let bindings = merge_bindings(
            vertex
                .reflection
                .globals
                .iter()
                .chain(fragment.iter().flat_map(|f| f.reflection.globals.iter())),
        )
        .map_err(fail)?;

        log::debug!("linked program `{name}`");
        Ok(Self {
            name,
            vertex,
            fragment,
            bindings,
        })
    }

    pub fn vertex(&self) -> &ShaderUnit {
        &self.vertex
    }

    pub fn fragment(&self) -> Option<&ShaderUnit> {
        self.fragment.as_deref()
    }

    /// `(group, binding)` of the resource the program declares as `name`.
    pub fn binding(&self, name: &str) -> Option<(u32, u32)> {
        self.bindings
            .iter()
            .find(|b| b.name == name)
            .map(|b| (b.group, b.binding))
    }

    pub fn bindings(&self) -> &[GlobalBinding] {
        &self.bindings
    }
}

/// Unions the declarations of several units; one name must map to one slot
/// and one slot to one name.
fn merge_bindings<'a>(
    decls: impl Iterator<Item = &'a GlobalBinding>,
) -> Result<Vec<GlobalBinding>, String> {
    let mut out: Vec<GlobalBinding> = Vec::new();
    for decl in decls {
        let same_name = out.iter().find(|b| b.name == decl.name);
        let same_slot = out
            .iter()
            .find(|b| b.group == decl.group && b.binding == decl.binding);

        match (same_name, same_slot) {
            (None, None) => out.push(decl.clone()),
            (Some(a), Some(b)) if a == b => {}
            (Some(prev), _) => {
                return Err(format!(
                    "`{}` declared at ({}, {}) and ({}, {})",
                    decl.name, prev.group, prev.binding, decl.group, decl.binding
                ));
            }
            (None, Some(prev)) => {
                return Err(format!(
                    "slot ({}, {}) declared as both `{}` and `{}`",
                    decl.group, decl.binding, prev.name, decl.name
                ));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(name: &str, group: u32, binding: u32) -> GlobalBinding {
        GlobalBinding {
            name: name.into(),
            group,
            binding,
        }
    }

    #[test]
    fn shared_declarations_merge() {
        let v = [b("camera", 0, 0)];
        let f = [b("camera", 0, 0), b("color_texture", 1, 1)];
        let merged = merge_bindings(v.iter().chain(f.iter())).unwrap();
        assert_eq!(merged, vec![b("camera", 0, 0), b("color_texture", 1, 1)]);
    }

    #[test]
    fn one_name_two_slots_is_rejected() {
        let decls = [b("camera", 0, 0), b("camera", 0, 1)];
        let err = merge_bindings(decls.iter()).unwrap_err();
        assert!(err.contains("`camera`"));
    }

    #[test]
    fn one_slot_two_names_is_rejected() {
        let decls = [b("a", 1, 2), b("b", 1, 2)];
        assert!(merge_bindings(decls.iter()).is_err());
    }
}
