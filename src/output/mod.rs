//! Output formats: JSON ground truth and debug overlays.

mod json;
mod overlay;

pub use json::{from_json, to_json, JsonFormat};
pub use overlay::{draw_cell_boxes, draw_grid_lines, OverlayKind, CELL_COLOR, LINE_COLOR};
