//! Figure rendering.
//!
//! - figure/panel descriptions and drawing (`chart`)
//! - TrueType font registration (`fonts`)
//! - saving to PNG or SVG (`save_figure`)

pub mod chart;
pub mod fonts;

use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::domain::FigureFormat;
use crate::error::AppError;

pub use chart::*;

/// Render `figure` to `<dir>/<stem>.<ext>`.
///
/// A font must have been registered with [`fonts::ensure_registered`] first.
pub fn save_figure(
    figure: &Figure,
    dir: &Path,
    stem: &str,
    format: FigureFormat,
) -> Result<PathBuf, AppError> {
    if !fonts::is_registered() {
        return Err(AppError::new(
            2,
            "No plot font registered; pass --font <file.ttf> or set FEPHASE_FONT.",
        ));
    }

    let path = dir.join(format!("{stem}.{}", format.extension()));
    let size = (figure.width, figure.height);
    let rendered = match format {
        FigureFormat::Png => render(BitMapBackend::new(&path, size).into_drawing_area(), figure),
        FigureFormat::Svg => render(SVGBackend::new(&path, size).into_drawing_area(), figure),
    };
    rendered.map_err(|e| AppError::new(2, format!("Failed to render {}: {e}", path.display())))?;

    info!(path = %path.display(), "saved figure");
    println!("Saved: {}", path.display());
    Ok(path)
}

fn render<DB: DrawingBackend>(root: DrawingArea<DB, Shift>, figure: &Figure) -> chart::DrawResult
where
    DB::ErrorType: 'static,
{
    figure.draw(&root)?;
    root.present()?;
    Ok(())
}
