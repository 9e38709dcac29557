//! Host × port open-port matrix and its PNG rendering.
//!
//! The image is a convenience artifact. Whether it can be drawn at all is
//! decided up front by [`probe_renderer`]; an unavailable renderer yields
//! [`RenderOutcome::Skipped`] rather than an error.

mod matrix;
#[cfg(feature = "render")]
mod raster;

pub use matrix::OpenPortMatrix;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming a TrueType font for axis labels.
pub const FONT_ENV: &str = "PORTGRID_FONT";

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unusable font {}: {reason}", path.display())]
    Font { path: PathBuf, reason: String },
    #[error("failed to draw heatmap: {0}")]
    Draw(String),
}

/// Font used for the title and axis labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFile {
    pub path: PathBuf,
}

/// Result of checking whether a heatmap can be rendered here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererCapability {
    Available(FontFile),
    Unavailable(String),
}

impl RendererCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, RendererCapability::Available(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Written,
    Skipped(String),
}

/// Decide whether rendering can run. `font_override` wins over the
/// `PORTGRID_FONT` environment variable, which wins over well-known system
/// font locations.
pub fn probe_renderer(font_override: Option<&Path>) -> RendererCapability {
    if !cfg!(feature = "render") {
        return RendererCapability::Unavailable("built without the `render` feature".to_string());
    }
    if let Some(p) = font_override {
        return font_at(p);
    }
    if let Some(p) = std::env::var_os(FONT_ENV).filter(|v| !v.is_empty()) {
        return font_at(Path::new(&p));
    }
    match FONT_CANDIDATES.iter().map(|p| Path::new(p)).find(|p| p.is_file()) {
        Some(p) => RendererCapability::Available(FontFile { path: p.to_path_buf() }),
        None => RendererCapability::Unavailable(format!("no TrueType font found; set {} or --font", FONT_ENV)),
    }
}

fn font_at(path: &Path) -> RendererCapability {
    if path.is_file() {
        RendererCapability::Available(FontFile { path: path.to_path_buf() })
    } else {
        RendererCapability::Unavailable(format!("font not found: {}", path.display()))
    }
}

/// Render `matrix` to a PNG at `path`, consulting `capability` once on entry.
pub fn render_png(matrix: &OpenPortMatrix, path: &Path, capability: &RendererCapability) -> Result<RenderOutcome, HeatmapError> {
    let font = match capability {
        RendererCapability::Available(font) => font,
        RendererCapability::Unavailable(reason) => return Ok(RenderOutcome::Skipped(reason.clone())),
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| HeatmapError::CreateDir { path: dir.to_path_buf(), source })?;
    }
    debug!(hosts = matrix.hosts().len(), ports = matrix.ports().len(), font = %font.path.display(), "rendering heatmap");
    draw(matrix, path, font)
}

#[cfg(feature = "render")]
fn draw(matrix: &OpenPortMatrix, path: &Path, font: &FontFile) -> Result<RenderOutcome, HeatmapError> {
    raster::draw(matrix, path, font)?;
    Ok(RenderOutcome::Written)
}

#[cfg(not(feature = "render"))]
fn draw(_matrix: &OpenPortMatrix, _path: &Path, _font: &FontFile) -> Result<RenderOutcome, HeatmapError> {
    Ok(RenderOutcome::Skipped("built without the `render` feature".to_string()))
}

#[cfg(all(test, feature = "render"))]
pub(crate) fn probe_font_for_tests() -> Option<FontFile> {
    match probe_renderer(None) {
        RendererCapability::Available(font) => Some(font),
        RendererCapability::Unavailable(_) => None,
    }
}
