//! Debug overlays drawn over table images.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::model::{BoundingBox, Line, Orientation, Table};

/// Outline color for recovered cells.
pub const CELL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Stroke color for grid lines.
pub const LINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const CELL_THICKNESS: i32 = 3;
const LINE_THICKNESS: u32 = 4;

/// Kind of debug overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayKind {
    /// Cell outlines
    Cells,
    /// Separator lines
    Lines,
}

impl OverlayKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            OverlayKind::Cells => "cells",
            OverlayKind::Lines => "lines",
        }
    }
}

/// Copy of `image` with each cell box outlined.
pub fn draw_cell_boxes(image: &RgbImage, cells: &[BoundingBox]) -> RgbImage {
    let mut canvas = image.clone();
    let half = CELL_THICKNESS / 2;
    for cell in cells {
        // Outline passes through the exclusive right/bottom edges
        for d in -half..=half {
            let w = cell.width as i32 + 1 - 2 * d;
            let h = cell.height as i32 + 1 - 2 * d;
            if w <= 0 || h <= 0 {
                continue;
            }
            let rect = Rect::at(cell.x as i32 + d, cell.y as i32 + d).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut canvas, rect, CELL_COLOR);
        }
    }
    canvas
}

/// Copy of `image` with the table's separator lines drawn.
pub fn draw_grid_lines(image: &RgbImage, table: &Table) -> RgbImage {
    let mut canvas = image.clone();
    for line in table.horizontal_lines.iter().chain(&table.vertical_lines) {
        draw_line(&mut canvas, line);
    }
    canvas
}

fn draw_line(canvas: &mut RgbImage, line: &Line) {
    let offset = (LINE_THICKNESS / 2) as i32;
    let rect = match line.orientation() {
        Orientation::Horizontal => {
            let length = line.x2.abs_diff(line.x1) + 1;
            Rect::at(line.x1.min(line.x2) as i32, line.position() as i32 - offset).of_size(length, LINE_THICKNESS)
        }
        Orientation::Vertical => {
            let length = line.y2.abs_diff(line.y1) + 1;
            Rect::at(line.position() as i32 - offset, line.y1.min(line.y2) as i32).of_size(LINE_THICKNESS, length)
        }
    };
    draw_filled_rect_mut(canvas, rect, LINE_COLOR);
}
