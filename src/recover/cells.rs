//! Cell box recovery from a render where every cell has its own color.

use image::RgbImage;

use crate::model::{contained, BoundingBox, Color};

use super::options::CellOptions;
use super::segment::{color_mask, external_boxes};

/// Why a color scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// Every color up to the bound was tried
    Exhausted,
    /// The first two colors were both absent: the table's colors are
    /// elsewhere (typically a continuation page)
    LeadingAbsent,
    /// Too many consecutive colors were absent
    AbsentLimit,
}

/// Outcome of scanning one table image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellScan {
    /// Cell boxes in color allocation order, nested boxes removed
    pub cells: Vec<BoundingBox>,
    /// Number of colors examined
    pub scanned: usize,
    /// Reason the scan ended
    pub stop: ScanStop,
}

/// Recovers cell boxes by exact-color segmentation.
#[derive(Debug, Clone, Default)]
pub struct CellDetector {
    options: CellOptions,
}

impl CellDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CellOptions) -> Self {
        Self { options }
    }

    /// Recover the cell boxes of `table`, in color allocation order.
    ///
    /// Only the first `max_cells` colors are considered.
    pub fn detect(&self, table: &RgbImage, colors: &[Color], max_cells: usize) -> Vec<BoundingBox> {
        self.scan(table, colors, max_cells).cells
    }

    /// Like [`CellDetector::detect`], also reporting how the scan ended.
    pub fn scan(&self, table: &RgbImage, colors: &[Color], max_cells: usize) -> CellScan {
        let mut candidates = Vec::new();
        let mut absent = 0usize;
        let mut scanned = 0usize;
        let mut stop = ScanStop::Exhausted;

        for (i, &color) in colors.iter().take(max_cells).enumerate() {
            scanned += 1;
            let boxes = external_boxes(&color_mask(table, color));
            if !boxes.is_empty() {
                absent = 0;
                candidates.extend(boxes);
                continue;
            }

            absent += 1;
            if i == 1 && absent == 2 {
                stop = ScanStop::LeadingAbsent;
                break;
            }
            if absent >= self.options.absent_limit {
                stop = ScanStop::AbsentLimit;
                break;
            }
        }

        let found = candidates.len();
        let cells = drop_nested(candidates);
        log::debug!(
            "Cell scan: {} colors, {} contours, {} cells, stop {:?}",
            scanned,
            found,
            cells.len(),
            stop
        );
        CellScan {
            cells,
            scanned,
            stop,
        }
    }
}

/// Remove every box lying inside a different box of the list.
///
/// Containment uses inclusive edges. Exact duplicates do not remove each
/// other. Quadratic in the number of boxes.
pub fn drop_nested(boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
    boxes
        .iter()
        .filter(|inner| {
            !boxes
                .iter()
                .any(|outer| outer != *inner && contained(inner, outer))
        })
        .copied()
        .collect()
}
