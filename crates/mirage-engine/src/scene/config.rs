use std::path::PathBuf;

use anyhow::{Context, Result};

use super::layout::LayoutParams;

/// Overrides the layout seed; unset means a fresh seed per run.
pub const SEED_VAR: &str = "MIRAGE_SEED";
/// Overrides the directory shaders are loaded from.
pub const SHADER_DIR_VAR: &str = "MIRAGE_SHADER_DIR";
/// Font file for the overlay.
pub const FONT_VAR: &str = "MIRAGE_FONT";

/// Scene configuration.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Root the shader programs are resolved against.
    pub shader_dir: PathBuf,

    /// Overlay font. When unset, a few common system fonts are tried.
    pub font_path: Option<PathBuf>,

    pub layout: LayoutParams,

    /// Seed of the first layout; regenerated layouts continue from the same
    /// generator.
    pub seed: Option<u64>,

    pub camera_far: f32,

    /// World-space size of one shadow-map texel.
    pub shadow_texel_size: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders")),
            font_path: None,
            layout: LayoutParams::default(),
            seed: None,
            camera_far: 1000.0,
            shadow_texel_size: 1.0 / 256.0,
        }
    }
}

impl SceneConfig {
    /// Defaults with the `MIRAGE_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(seed) = lookup(SEED_VAR) {
            let seed = seed
                .trim()
                .parse()
                .with_context(|| format!("{SEED_VAR}=`{seed}` is not an unsigned integer"))?;
            config.seed = Some(seed);
        }
        if let Some(dir) = lookup(SHADER_DIR_VAR) {
            config.shader_dir = PathBuf::from(dir);
        }
        if let Some(font) = lookup(FONT_VAR) {
            config.font_path = Some(PathBuf::from(font));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|&(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = SceneConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.seed, None);
        assert!(config.shader_dir.ends_with("shaders"));
        assert!(config.font_path.is_none());
        assert_eq!(config.camera_far, 1000.0);
        assert_eq!(config.layout, LayoutParams::default());
    }

    #[test]
    fn environment_overrides_apply() {
        let config = SceneConfig::from_lookup(lookup(&[
            (SEED_VAR, " 1234 "),
            (SHADER_DIR_VAR, "/tmp/shaders"),
            (FONT_VAR, "/tmp/font.ttf"),
        ]))
        .unwrap();
        assert_eq!(config.seed, Some(1234));
        assert_eq!(config.shader_dir, PathBuf::from("/tmp/shaders"));
        assert_eq!(config.font_path, Some(PathBuf::from("/tmp/font.ttf")));
    }

    #[test]
    fn bad_seed_is_an_error() {
        let err = SceneConfig::from_lookup(lookup(&[(SEED_VAR, "soon")])).unwrap_err();
        assert!(err.to_string().contains("MIRAGE_SEED"));
    }
}
