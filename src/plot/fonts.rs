//! TrueType font discovery and registration for Plotters' `ab_glyph` text path.
//!
//! Plotters is built without font-kit, so text has no system fallback: a font
//! must be registered before the first figure is drawn.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::style::{FontStyle, register_font};
use tracing::{debug, info};

use crate::error::AppError;

/// Families used by the figures.
const FAMILIES: [&str; 3] = ["sans-serif", "serif", "monospace"];
const STYLES: [FontStyle; 4] = [
    FontStyle::Normal,
    FontStyle::Bold,
    FontStyle::Italic,
    FontStyle::Oblique,
];

/// Common locations on Linux, macOS and Windows.
const CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<Result<PathBuf, String>> = OnceLock::new();

/// First usable font: the explicit path if given, else a known system location.
pub fn find_font(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.is_file().then(|| path.to_path_buf());
    }
    CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Register the font for every family and style. Only the first call does
/// any work; later calls return its outcome.
pub fn ensure_registered(explicit: Option<&Path>) -> Result<PathBuf, AppError> {
    REGISTERED
        .get_or_init(|| register(explicit))
        .clone()
        .map_err(|message| AppError::new(2, message))
}

pub fn is_registered() -> bool {
    matches!(REGISTERED.get(), Some(Ok(_)))
}

fn register(explicit: Option<&Path>) -> Result<PathBuf, String> {
    let path = find_font(explicit).ok_or_else(|| match explicit {
        Some(p) => format!("Font file {} does not exist.", p.display()),
        None => "No TrueType font found; pass --font <file.ttf> or set FEPHASE_FONT.".to_string(),
    })?;

    let bytes =
        fs::read(&path).map_err(|e| format!("Failed to read font {}: {e}", path.display()))?;
    // Plotters keeps the font for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());

    for family in FAMILIES {
        for style in STYLES {
            register_font(family, style, bytes)
                .map_err(|_| format!("Invalid TrueType font {}.", path.display()))?;
        }
    }
    debug!(families = ?FAMILIES, "font registered");
    info!(font = %path.display(), "using font");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_path_is_not_found() {
        assert!(find_font(Some(Path::new("/nonexistent/font.ttf"))).is_none());
    }

    #[test]
    fn explicit_existing_path_wins() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(find_font(Some(file.path())), Some(file.path().to_path_buf()));
    }
}
