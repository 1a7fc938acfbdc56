use std::fmt;
use std::path::PathBuf;

use mirage_shader::{ResolveError, ShaderKind};
use thiserror::Error;

/// Physical source position of a compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub path: PathBuf,
    pub line: u32,
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Failure to build a shader unit or link a program.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The backend has no stage for this kind.
    #[error("shader `{name}` has unsupported kind `{kind}`")]
    UnsupportedKind { name: String, kind: ShaderKind },

    #[error("failed to compile shader `{name}`{}:\n{message}", at(.location))]
    Compile {
        name: String,
        location: Option<SourceLine>,
        message: String,
    },

    #[error("failed to link program `{name}`: {message}")]
    Link { name: String, message: String },
}

fn at(location: &Option<SourceLine>) -> String {
    match location {
        Some(l) => format!(" at {l}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_mentions_physical_line() {
        let err = ShaderError::Compile {
            name: "ssr".into(),
            location: Some(SourceLine {
                path: "shaders/common.wgsl".into(),
                line: 12,
            }),
            message: "expected `;`".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("failed to compile shader `ssr` at shaders/common.wgsl:12:"));
        assert!(text.ends_with("expected `;`"));
    }

    #[test]
    fn compile_error_without_location() {
        let err = ShaderError::Compile {
            name: "ssr".into(),
            location: None,
            message: "bad".into(),
        };
        assert_eq!(err.to_string(), "failed to compile shader `ssr`:\nbad");
    }
}
