use std::path::{Path, PathBuf};

use thiserror::Error;

/// Fonts tried when no font is configured.
const SYSTEM_FONTS: [&str; 5] = [
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("failed to read font `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Parses a TrueType or OpenType font file.
pub fn load_font_file(path: &Path) -> Result<fontdue::Font, FontLoadError> {
    let bytes = std::fs::read(path).map_err(|source| FontLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()).map_err(|message| FontLoadError::Parse {
        path: path.to_path_buf(),
        message: message.to_string(),
    })
}

/// Loads `configured`, or the first system font that parses.
///
/// Returns `None` (and logs why) when nothing usable is found; the overlay
/// is then skipped.
pub fn find_font(configured: Option<&Path>) -> Option<fontdue::Font> {
    if let Some(path) = configured {
        return match load_font_file(path) {
            Ok(font) => {
                log::info!("overlay font {}", path.display());
                Some(font)
            }
            Err(err) => {
                log::warn!("{err}; overlay disabled");
                None
            }
        };
    }

    for candidate in SYSTEM_FONTS.iter().map(Path::new) {
        match load_font_file(candidate) {
            Ok(font) => {
                log::info!("overlay font {}", candidate.display());
                return Some(font);
            }
            Err(FontLoadError::Io { .. }) => continue,
            Err(err) => log::debug!("{err}"),
        }
    }
    log::warn!("no overlay font found (set MIRAGE_FONT); overlay disabled");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_font_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, FontLoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("mirage-font-test-{}.ttf", std::process::id()));
        std::fs::write(&path, b"definitely not a font").unwrap();
        let err = load_font_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, FontLoadError::Parse { .. }));
    }

    #[test]
    fn configured_font_that_fails_disables_overlay() {
        assert!(find_font(Some(Path::new("/nonexistent/font.ttf"))).is_none());
    }
}
