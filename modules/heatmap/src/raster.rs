use crate::{FontFile, HeatmapError, OpenPortMatrix};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontDesc, FontFamily, FontStyle};
use std::path::Path;
use std::sync::OnceLock;

const MARGIN: u32 = 20;
const TITLE_H: u32 = 50;
const CELL_H: u32 = 18;
const CHAR_W: u32 = 7;
const FOOTER_H: u32 = 50;

const OPEN: RGBColor = RGBColor(253, 231, 37);
const CLOSED: RGBColor = RGBColor(68, 1, 84);
const GRID: RGBColor = RGBColor(200, 200, 200);

/// Pixel geometry of the image for a given matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub width: u32,
    pub height: u32,
    pub grid_x: u32,
    pub grid_y: u32,
    pub cell_w: u32,
}

impl Layout {
    pub fn for_matrix(matrix: &OpenPortMatrix) -> Self {
        let host_chars = matrix.hosts().iter().map(|h| h.chars().count() as u32).max().unwrap_or(4).max(4);
        let port_chars = matrix.ports().iter().map(|p| p.to_string().len() as u32).max().unwrap_or(1);
        let cell_w = (port_chars * CHAR_W + 8).max(24);
        let grid_x = MARGIN + host_chars * CHAR_W + 10;
        let grid_y = TITLE_H;
        let cols = matrix.ports().len() as u32;
        let rows = matrix.hosts().len() as u32;
        Layout {
            width: (grid_x + cols * cell_w + MARGIN).max(640),
            height: (grid_y + rows * CELL_H + FOOTER_H + MARGIN).max(320),
            grid_x,
            grid_y,
            cell_w,
        }
    }

    fn cell_origin(&self, row: usize, col: usize) -> (i32, i32) {
        ((self.grid_x + col as u32 * self.cell_w) as i32, (self.grid_y + row as u32 * CELL_H) as i32)
    }
}

fn draw_err(e: impl std::fmt::Display) -> HeatmapError {
    HeatmapError::Draw(e.to_string())
}

/// Register the label font with plotters once per process.
fn ensure_font(font: &FontFile) -> Result<(), HeatmapError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            let bytes = std::fs::read(&font.path).map_err(|e| e.to_string())?;
            register_font(FontFamily::SansSerif.as_str(), FontStyle::Normal, Box::leak(bytes.into_boxed_slice()))
                .map_err(|_| "not a valid TrueType font".to_string())
        })
        .clone()
        .map_err(|reason| HeatmapError::Font { path: font.path.clone(), reason })
}

pub(crate) fn draw(matrix: &OpenPortMatrix, path: &Path, font: &FontFile) -> Result<(), HeatmapError> {
    ensure_font(font)?;
    let layout = Layout::for_matrix(matrix);
    let root = BitMapBackend::new(path, (layout.width, layout.height)).into_drawing_area();
    paint(&root, matrix, &layout)
}

fn paint<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, matrix: &OpenPortMatrix, layout: &Layout) -> Result<(), HeatmapError> {
    root.fill(&WHITE).map_err(draw_err)?;

    let title = FontDesc::new(FontFamily::SansSerif, 20.0, FontStyle::Normal);
    let label = FontDesc::new(FontFamily::SansSerif, 12.0, FontStyle::Normal);
    let m = MARGIN as i32;

    root.draw(&Text::new("Open Ports Heatmap", (m, m / 2), title)).map_err(draw_err)?;
    root.draw(&Text::new("Host", (m, layout.grid_y as i32 - 16), label.clone())).map_err(draw_err)?;

    let cw = layout.cell_w as i32;
    let ch = CELL_H as i32;
    for (row, host) in matrix.hosts().iter().enumerate() {
        let (_, y) = layout.cell_origin(row, 0);
        root.draw(&Text::new(host.as_str(), (m, y + 3), label.clone())).map_err(draw_err)?;
        for col in 0..matrix.ports().len() {
            let (x, y) = layout.cell_origin(row, col);
            let fill = if matrix.cell(row, col) { OPEN } else { CLOSED };
            root.draw(&Rectangle::new([(x, y), (x + cw, y + ch)], fill.filled())).map_err(draw_err)?;
            root.draw(&Rectangle::new([(x, y), (x + cw, y + ch)], GRID.stroke_width(1))).map_err(draw_err)?;
        }
    }

    let axis_y = (layout.grid_y + matrix.hosts().len() as u32 * CELL_H) as i32 + 4;
    for (col, port) in matrix.ports().iter().enumerate() {
        let (x, _) = layout.cell_origin(0, col);
        root.draw(&Text::new(port.to_string(), (x + 3, axis_y), label.clone())).map_err(draw_err)?;
    }
    root.draw(&Text::new("Port", (layout.grid_x as i32, axis_y + 20), label.clone())).map_err(draw_err)?;
    if matrix.is_empty() {
        root.draw(&Text::new("no open ports observed", (layout.grid_x as i32, layout.grid_y as i32 + 4), label)).map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    Ok(())
}
