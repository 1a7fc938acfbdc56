use std::io;
use std::path::{Component, Path, PathBuf};

/// Source of shader text, keyed by path.
///
/// The resolver only ever reads through this trait, so tests and tools can
/// resolve from memory.
pub trait SourceLoader {
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Reads shader files from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

impl<L: SourceLoader + ?Sized> SourceLoader for &L {
    fn load(&self, path: &Path) -> io::Result<String> {
        (**self).load(path)
    }
}

/// Lexically normalizes a path: drops `.` components and folds `dir/..`.
///
/// The filesystem is not consulted, so symlinks are not resolved. Leading `..`
/// components of a relative path are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize_path(Path::new("a/./b/../c.wgsl")), PathBuf::from("a/c.wgsl"));
        assert_eq!(normalize_path(Path::new("./a.vert")), PathBuf::from("a.vert"));
        assert_eq!(normalize_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn normalize_keeps_leading_parent() {
        assert_eq!(normalize_path(Path::new("../x/../y")), PathBuf::from("../y"));
        assert_eq!(normalize_path(Path::new("../../z")), PathBuf::from("../../z"));
    }

    #[test]
    fn normalize_absolute_stops_at_root() {
        assert_eq!(normalize_path(Path::new("/../a/b/..")), PathBuf::from("/a"));
    }
}
