use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::kind::ShaderKind;

/// What went wrong while flattening a shader.
#[derive(Debug, Error)]
pub enum ResolveErrorKind {
    #[error("cannot open `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("too many nested includes (limit is {limit}) at `{}`:{line}", .path.display())]
    TooManyNestedIncludes { limit: usize, path: PathBuf, line: u32 },

    #[error("malformed #include directive at `{}`:{line}, expected #include \"path\"", .path.display())]
    InvalidInclude { path: PathBuf, line: u32 },

    #[error("unknown shader type `{name}` at `{}`:{line}", .path.display())]
    UnknownKind { name: String, path: PathBuf, line: u32 },

    #[error("shader type `{found}` at `{}`:{line} conflicts with previously declared type `{declared}`", .path.display())]
    ConflictingKind {
        declared: ShaderKind,
        found: ShaderKind,
        path: PathBuf,
        line: u32,
    },
}

/// A resolution failure enriched with the root file and every file opened
/// before the failure.
///
/// `files[i]` is the path with file id `i`; the same ids appear in the
/// `// #line <n> <id>` markers of successfully resolved sources.
#[derive(Debug)]
pub struct ResolveError {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
    pub kind: ResolveErrorKind,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error while resolving shader `{}`:", self.root.display())?;
        write!(f, "{}", self.kind)?;
        if !self.files.is_empty() {
            write!(f, "\nList of paths:")?;
            for (i, path) in self.files.iter().enumerate() {
                write!(f, "\n  {i}: {}", path.display())?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ResolveErrorKind::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_files_with_ids() {
        let err = ResolveError {
            root: PathBuf::from("a.vert"),
            files: vec![PathBuf::from("a.vert"), PathBuf::from("lib/b.wgsl")],
            kind: ResolveErrorKind::InvalidInclude {
                path: PathBuf::from("lib/b.wgsl"),
                line: 3,
            },
        };
        let text = err.to_string();
        assert!(text.starts_with("error while resolving shader `a.vert`:\n"));
        assert!(text.contains("`lib/b.wgsl`:3"));
        assert!(text.ends_with("List of paths:\n  0: a.vert\n  1: lib/b.wgsl"));
    }
}
