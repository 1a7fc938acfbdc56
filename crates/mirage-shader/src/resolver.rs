//! Flattening of `#include` graphs with an explicit, bounded frame stack.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::directive::{self, Line};
use crate::error::{ResolveError, ResolveErrorKind};
use crate::kind::ShaderKind;
use crate::loader::{normalize_path, FsLoader, SourceLoader};

/// Default bound on include nesting. The root file is depth 0.
pub const MAX_INCLUDE_DEPTH: usize = 256;

// ── Output ────────────────────────────────────────────────────────────────

/// Physical origin of one line of flattened output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineOrigin {
    /// Index into [`ResolvedShader::files`].
    pub file: usize,
    /// 1-based line in that file.
    pub line: u32,
}

/// A fully flattened shader source.
#[derive(Debug, Clone)]
pub struct ResolvedShader {
    /// Debug name, the root file's base name.
    pub name: String,
    /// The expected kind, or the one the sources declare; `Unknown` if neither.
    pub kind: ShaderKind,
    pub source: String,
    /// Every file read, indexed by file id. `files[0]` is the root.
    pub files: Vec<PathBuf>,
    origins: Vec<LineOrigin>,
}

impl ResolvedShader {
    pub fn line_count(&self) -> usize {
        self.origins.len()
    }

    /// Origin of the 1-based output `line`.
    pub fn origin(&self, line: u32) -> Option<LineOrigin> {
        let idx = usize::try_from(line).ok()?.checked_sub(1)?;
        self.origins.get(idx).copied()
    }

    /// Physical file and line of the 1-based output `line`.
    pub fn locate(&self, line: u32) -> Option<(&Path, u32)> {
        let o = self.origin(line)?;
        Some((self.files.get(o.file)?.as_path(), o.line))
    }
}

// ── Resolver ──────────────────────────────────────────────────────────────

/// Shader preprocessor.
#[derive(Debug, Clone)]
pub struct Resolver<L = FsLoader> {
    loader: L,
    max_depth: usize,
}

impl Resolver<FsLoader> {
    pub fn new() -> Self {
        Self::with_loader(FsLoader)
    }
}

impl Default for Resolver<FsLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: SourceLoader> Resolver<L> {
    pub fn with_loader(loader: L) -> Self {
        Self {
            loader,
            max_depth: MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Flattens `root` into one source blob.
    ///
    /// An `expected` kind other than `Unknown` counts as a declaration: a
    /// `#type` naming another kind fails with `ConflictingKind`. Any failure
    /// carries the root path and the list of files opened so far.
    pub fn resolve(
        &self,
        root: impl AsRef<Path>,
        expected: ShaderKind,
    ) -> Result<ResolvedShader, ResolveError> {
        let root = normalize_path(root.as_ref());
        let mut out = Output {
            declared: (expected != ShaderKind::Unknown).then_some(expected),
            ..Output::default()
        };

        match self.flatten(&root, &mut out) {
            Ok(()) => Ok(ResolvedShader {
                name: base_name(&root),
                kind: out.declared.unwrap_or(ShaderKind::Unknown),
                source: out.text,
                files: out.files,
                origins: out.origins,
            }),
            Err(kind) => Err(ResolveError {
                root,
                files: out.files,
                kind,
            }),
        }
    }

    fn flatten(&self, root: &Path, out: &mut Output) -> Result<(), ResolveErrorKind> {
        let mut stack = vec![self.open(root, out)?];

        while let Some(frame) = stack.last_mut() {
            let here = LineOrigin {
                file: frame.file,
                line: frame.line + 1,
            };
            let Some((text, terminator)) = frame.next_line() else {
                stack.pop();
                if let Some(parent) = stack.last() {
                    out.emit_marker(parent.file, parent.line);
                }
                continue;
            };

            let mut include = None;
            match directive::classify(text) {
                Line::Text(text) => out.emit(text, terminator, here),
                Line::Type(name) => {
                    let path = out.files[here.file].clone();
                    out.declare(name, &path, here.line)?;
                    out.emit("", terminator, here);
                }
                Line::Include(rel) => {
                    let dir = out.files[here.file].parent().unwrap_or(Path::new(""));
                    include = Some(normalize_path(&dir.join(rel)));
                }
                Line::MalformedInclude => {
                    return Err(ResolveErrorKind::InvalidInclude {
                        path: out.files[here.file].clone(),
                        line: here.line,
                    });
                }
            }

            if let Some(target) = include {
                if stack.len() > self.max_depth {
                    return Err(ResolveErrorKind::TooManyNestedIncludes {
                        limit: self.max_depth,
                        path: out.files[here.file].clone(),
                        line: here.line,
                    });
                }
                let child = self.open(&target, out)?;
                stack.push(child);
            }
        }

        Ok(())
    }

    fn open(&self, path: &Path, out: &mut Output) -> Result<Frame, ResolveErrorKind> {
        let file = out.file_id(path);
        let text = self
            .loader
            .load(path)
            .map_err(|source| ResolveErrorKind::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Frame {
            file,
            text,
            pos: 0,
            line: 0,
        })
    }
}

/// Resolves `root` from the filesystem with the default nesting bound.
pub fn resolve_file(
    root: impl AsRef<Path>,
    expected: ShaderKind,
) -> Result<ResolvedShader, ResolveError> {
    Resolver::new().resolve(root, expected)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Frame ─────────────────────────────────────────────────────────────────

/// One open file on the include stack.
struct Frame {
    file: usize,
    text: String,
    pos: usize,
    /// Number of lines consumed so far.
    line: u32,
}

impl Frame {
    /// Returns the next line split into content and terminator (`""`, `"\n"`
    /// or `"\r\n"`).
    fn next_line(&mut self) -> Option<(&str, &str)> {
        if self.pos >= self.text.len() {
            return None;
        }

        let start = self.pos;
        let rest = &self.text[start..];
        let (consumed, body) = match rest.find('\n') {
            Some(nl) if rest[..nl].ends_with('\r') => (nl + 1, nl - 1),
            Some(nl) => (nl + 1, nl),
            None => (rest.len(), rest.len()),
        };

        self.pos += consumed;
        self.line += 1;

        let line = &self.text[start..start + consumed];
        Some((&line[..body], &line[body..]))
    }
}

// ── Output accumulator ────────────────────────────────────────────────────

#[derive(Default)]
struct Output {
    text: String,
    origins: Vec<LineOrigin>,
    files: Vec<PathBuf>,
    declared: Option<ShaderKind>,
}

impl Output {
    fn file_id(&mut self, path: &Path) -> usize {
        if let Some(id) = self.files.iter().position(|p| p == path) {
            return id;
        }
        self.files.push(path.to_path_buf());
        self.files.len() - 1
    }

    fn emit(&mut self, text: &str, terminator: &str, origin: LineOrigin) {
        self.break_line();
        self.text.push_str(text);
        self.text.push_str(terminator);
        self.origins.push(origin);
    }

    /// Emits `// #line <n> <file>` so the following text reads as line `n`
    /// of `file`. The marker itself maps to the include directive.
    fn emit_marker(&mut self, file: usize, include_line: u32) {
        self.break_line();
        let _ = writeln!(self.text, "// #line {} {}", include_line + 1, file);
        self.origins.push(LineOrigin {
            file,
            line: include_line,
        });
    }

    /// Terminates a previous line that ended at end-of-file without newline.
    fn break_line(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    fn declare(&mut self, name: &str, path: &Path, line: u32) -> Result<(), ResolveErrorKind> {
        let found = ShaderKind::from_directive(name).ok_or_else(|| ResolveErrorKind::UnknownKind {
            name: name.to_string(),
            path: path.to_path_buf(),
            line,
        })?;

        match self.declared {
            Some(declared) if declared != found => Err(ResolveErrorKind::ConflictingKind {
                declared,
                found,
                path: path.to_path_buf(),
                line,
            }),
            _ => {
                self.declared = Some(found);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    #[derive(Default)]
    struct MemoryLoader {
        files: HashMap<PathBuf, String>,
    }

    impl MemoryLoader {
        fn with(mut self, path: &str, text: &str) -> Self {
            self.files.insert(PathBuf::from(path), text.to_string());
            self
        }
    }

    impl SourceLoader for MemoryLoader {
        fn load(&self, path: &Path) -> io::Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    /// `f0` includes `f1` includes ... `fN`; file `fi` sits at depth `i`.
    fn chain(n: usize) -> MemoryLoader {
        let mut loader = MemoryLoader::default();
        for i in 0..n {
            loader = loader.with(
                &format!("f{i}.wgsl"),
                &format!("#include \"f{}.wgsl\"\nline{i}\n", i + 1),
            );
        }
        loader.with(&format!("f{n}.wgsl"), "leaf\n")
    }

    // ── passthrough ──

    #[test]
    fn source_without_includes_is_verbatim() {
        let src = "fn a() {}\r\n\n  let x = 1;\nlast";
        let loader = MemoryLoader::default().with("plain.frag", src);
        let shader = Resolver::with_loader(loader)
            .resolve("plain.frag", ShaderKind::Fragment)
            .unwrap();
        assert_eq!(shader.source, src);
        assert_eq!(shader.line_count(), 4);
        assert_eq!(shader.name, "plain.frag");
    }

    #[test]
    fn type_line_becomes_blank() {
        let loader = MemoryLoader::default().with("a.wgsl", "// head\n  #type vertex\nbody\n");
        let shader = Resolver::with_loader(loader)
            .resolve("a.wgsl", ShaderKind::Unknown)
            .unwrap();
        assert_eq!(shader.source, "// head\n\nbody\n");
        assert_eq!(shader.kind, ShaderKind::Vertex);
    }

    #[test]
    fn expected_kind_applies_without_directive() {
        let loader = MemoryLoader::default().with("a.wgsl", "body\n");
        let r = Resolver::with_loader(loader);
        assert_eq!(r.resolve("a.wgsl", ShaderKind::Fragment).unwrap().kind, ShaderKind::Fragment);
        assert_eq!(r.resolve("a.wgsl", ShaderKind::Unknown).unwrap().kind, ShaderKind::Unknown);
    }

    // ── includes ──

    #[test]
    fn includes_expand_in_order_with_markers() {
        let loader = MemoryLoader::default()
            .with("shaders/main.vert", "a\n#include \"lib/b.wgsl\"\nc\n")
            .with("shaders/lib/b.wgsl", "b1\n#include \"c.wgsl\"\nb2\n")
            .with("shaders/lib/c.wgsl", "c1\n");
        let shader = Resolver::with_loader(loader)
            .resolve("shaders/main.vert", ShaderKind::Vertex)
            .unwrap();

        assert_eq!(
            shader.source,
            "a\nb1\nc1\n// #line 3 1\nb2\n// #line 3 0\nc\n"
        );
        assert_eq!(
            shader.files,
            vec![
                PathBuf::from("shaders/main.vert"),
                PathBuf::from("shaders/lib/b.wgsl"),
                PathBuf::from("shaders/lib/c.wgsl"),
            ]
        );
        assert_eq!(shader.locate(3), Some((Path::new("shaders/lib/c.wgsl"), 1)));
        assert_eq!(shader.locate(5), Some((Path::new("shaders/lib/b.wgsl"), 3)));
        assert_eq!(shader.locate(7), Some((Path::new("shaders/main.vert"), 3)));
        assert_eq!(shader.origin(6), Some(LineOrigin { file: 0, line: 2 }));
        assert_eq!(shader.origin(0), None);
        assert_eq!(shader.origin(8), None);
    }

    #[test]
    fn included_file_without_trailing_newline() {
        let loader = MemoryLoader::default()
            .with("a.wgsl", "#include \"b.wgsl\"\nafter")
            .with("b.wgsl", "inner");
        let shader = Resolver::with_loader(loader)
            .resolve("a.wgsl", ShaderKind::Unknown)
            .unwrap();
        assert_eq!(shader.source, "inner\n// #line 2 0\nafter");
    }

    #[test]
    fn parent_directory_includes_normalize() {
        let loader = MemoryLoader::default()
            .with("s/pass/x.frag", "#include \"../common.wgsl\"\n")
            .with("s/common.wgsl", "shared\n");
        let shader = Resolver::with_loader(loader)
            .resolve("s/./pass/x.frag", ShaderKind::Fragment)
            .unwrap();
        assert_eq!(shader.files[1], PathBuf::from("s/common.wgsl"));
        assert!(shader.source.starts_with("shared\n"));
    }

    // ── nesting bound ──

    #[test]
    fn nesting_up_to_bound_succeeds() {
        let shader = Resolver::with_loader(chain(4))
            .with_max_depth(4)
            .resolve("f0.wgsl", ShaderKind::Unknown)
            .unwrap();
        let leaf = shader.source.find("leaf").unwrap();
        let inner = shader.source.find("line3").unwrap();
        let outer = shader.source.find("line0").unwrap();
        assert!(leaf < inner && inner < outer);
        assert_eq!(shader.files.len(), 5);
    }

    #[test]
    fn nesting_past_bound_fails() {
        let err = Resolver::with_loader(chain(5))
            .with_max_depth(4)
            .resolve("f0.wgsl", ShaderKind::Unknown)
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ResolveErrorKind::TooManyNestedIncludes { limit: 4, .. }
        ));
        assert_eq!(err.root, PathBuf::from("f0.wgsl"));
    }

    #[test]
    fn default_bound_is_256() {
        let ok = Resolver::with_loader(chain(MAX_INCLUDE_DEPTH));
        assert!(ok.resolve("f0.wgsl", ShaderKind::Unknown).is_ok());

        let deep = Resolver::with_loader(chain(MAX_INCLUDE_DEPTH + 1));
        assert!(deep.resolve("f0.wgsl", ShaderKind::Unknown).is_err());
    }

    #[test]
    fn include_cycle_terminates_with_error() {
        let loader = MemoryLoader::default()
            .with("A.vert", "#include \"B.glsl\"\n")
            .with("B.glsl", "#include \"A.vert\"\n");
        let err = Resolver::with_loader(loader)
            .resolve("A.vert", ShaderKind::Vertex)
            .unwrap_err();
        assert!(matches!(err.kind, ResolveErrorKind::TooManyNestedIncludes { .. }));
        assert_eq!(err.files, vec![PathBuf::from("A.vert"), PathBuf::from("B.glsl")]);
    }

    // ── kinds ──

    #[test]
    fn conflicting_kinds_fail_transitively() {
        let loader = MemoryLoader::default()
            .with("a.vert", "#type vertex\n#include \"b.wgsl\"\n")
            .with("b.wgsl", "#type fragment\n");
        let err = Resolver::with_loader(loader)
            .resolve("a.vert", ShaderKind::Unknown)
            .unwrap_err();
        match err.kind {
            ResolveErrorKind::ConflictingKind {
                declared,
                found,
                path,
                line,
            } => {
                assert_eq!(declared, ShaderKind::Vertex);
                assert_eq!(found, ShaderKind::Fragment);
                assert_eq!(path, PathBuf::from("b.wgsl"));
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn directive_contradicting_expected_kind_fails() {
        let loader = MemoryLoader::default().with("a.vert", "#type fragment\nbody\n");
        let err = Resolver::with_loader(loader)
            .resolve("a.vert", ShaderKind::Vertex)
            .unwrap_err();
        match err.kind {
            ResolveErrorKind::ConflictingKind {
                declared,
                found,
                path,
                line,
            } => {
                assert_eq!(declared, ShaderKind::Vertex);
                assert_eq!(found, ShaderKind::Fragment);
                assert_eq!(path, PathBuf::from("a.vert"));
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn included_directive_contradicting_expected_kind_fails() {
        let loader = MemoryLoader::default()
            .with("s/a.frag", "x\n#include \"lib/b.wgsl\"\n")
            .with("s/lib/b.wgsl", "\n#type vertex\n");
        let err = Resolver::with_loader(loader)
            .resolve("s/a.frag", ShaderKind::Fragment)
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ResolveErrorKind::ConflictingKind {
                declared: ShaderKind::Fragment,
                found: ShaderKind::Vertex,
                line: 2,
                ..
            }
        ));
        assert_eq!(err.files, vec![PathBuf::from("s/a.frag"), PathBuf::from("s/lib/b.wgsl")]);
    }

    #[test]
    fn directive_matching_expected_kind_is_accepted() {
        let loader = MemoryLoader::default().with("a.vert", "#type vertex\nbody\n");
        let shader = Resolver::with_loader(loader)
            .resolve("a.vert", ShaderKind::Vertex)
            .unwrap();
        assert_eq!(shader.kind, ShaderKind::Vertex);
        assert_eq!(shader.source, "\nbody\n");
    }

    #[test]
    fn repeated_identical_kind_is_accepted() {
        let loader = MemoryLoader::default()
            .with("a.frag", "#type fragment\n#include \"b.wgsl\"\n")
            .with("b.wgsl", "#type fragment\nx\n");
        let shader = Resolver::with_loader(loader)
            .resolve("a.frag", ShaderKind::Unknown)
            .unwrap();
        assert_eq!(shader.kind, ShaderKind::Fragment);
    }

    #[test]
    fn unknown_kind_fails() {
        let loader = MemoryLoader::default().with("a.wgsl", "\n#type compute\n");
        let err = Resolver::with_loader(loader)
            .resolve("a.wgsl", ShaderKind::Unknown)
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ResolveErrorKind::UnknownKind { ref name, line: 2, .. } if name == "compute"
        ));
    }

    // ── failures ──

    #[test]
    fn missing_include_lists_touched_files() {
        let loader = MemoryLoader::default().with("root.frag", "x\n#include \"gone.wgsl\"\n");
        let err = Resolver::with_loader(loader)
            .resolve("root.frag", ShaderKind::Fragment)
            .unwrap_err();
        assert!(matches!(err.kind, ResolveErrorKind::Io { .. }));
        let text = err.to_string();
        assert!(text.contains("root.frag"));
        assert!(text.contains("List of paths:\n  0: root.frag\n  1: gone.wgsl"));
    }

    #[test]
    fn malformed_include_fails() {
        let loader = MemoryLoader::default().with("a.wgsl", "#include gone.wgsl\n");
        let err = Resolver::with_loader(loader)
            .resolve("a.wgsl", ShaderKind::Unknown)
            .unwrap_err();
        assert!(matches!(err.kind, ResolveErrorKind::InvalidInclude { line: 1, .. }));
    }
}
