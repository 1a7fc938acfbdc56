use std::fmt;
use std::path::Path;

/// Pipeline stage a shader source is written for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    Vertex,
    Geometry,
    Fragment,
    Unknown,
}

impl ShaderKind {
    /// Parses the argument of a `#type` directive.
    pub fn from_directive(name: &str) -> Option<Self> {
        match name {
            "vertex" => Some(Self::Vertex),
            "geometry" => Some(Self::Geometry),
            "fragment" => Some(Self::Fragment),
            _ => None,
        }
    }

    /// Guesses the kind from a conventional file suffix (`.vert`, `.geom`, `.frag`).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("vert") => Self::Vertex,
            Some("geom") => Self::Geometry,
            Some("frag") => Self::Fragment,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_names() {
        assert_eq!(ShaderKind::from_directive("vertex"), Some(ShaderKind::Vertex));
        assert_eq!(ShaderKind::from_directive("fragment"), Some(ShaderKind::Fragment));
        assert_eq!(ShaderKind::from_directive("geometry"), Some(ShaderKind::Geometry));
        assert_eq!(ShaderKind::from_directive("compute"), None);
        assert_eq!(ShaderKind::from_directive("Vertex"), None);
    }

    #[test]
    fn path_suffixes() {
        assert_eq!(ShaderKind::from_path(Path::new("a/b.vert")), ShaderKind::Vertex);
        assert_eq!(ShaderKind::from_path(Path::new("b.frag")), ShaderKind::Fragment);
        assert_eq!(ShaderKind::from_path(Path::new("common.wgsl")), ShaderKind::Unknown);
        assert_eq!(ShaderKind::from_path(Path::new("noext")), ShaderKind::Unknown);
    }
}
