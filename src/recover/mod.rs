//! Structure recovery from pixel evidence.
//!
//! The stages, in pipeline order:
//!
//! - [`ColorAllocator`]: unique marker colors for cells
//! - [`TableLocator`]: table extents from two border renders
//! - [`CellDetector`]: cell boxes from a render with colored cells
//! - [`LineBuilder`]: separator lines from cell boxes, plus the grid gate

mod allocator;
mod cells;
mod lines;
mod localizer;
mod options;
mod segment;
mod similarity;

pub use allocator::{allocate, ColorAllocator, COLOR_SPACE_SIZE};
pub use cells::{drop_nested, CellDetector, CellScan, ScanStop};
pub use lines::{merge_positions, GridLines, LineBuilder};
pub use localizer::{LocatedPage, LocatedTable, TableLocator};
pub use options::{CellOptions, LineOptions, LocatorOptions};
pub use segment::{color_mask, contains_color, crop, external_boxes, threshold_inverted};
pub use similarity::{structural_similarity, SimilarityMap};
