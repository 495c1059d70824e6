//! Grid line synthesis from recovered cell boxes.
//!
//! Every cell edge is a candidate separator. Candidates closer than a
//! tolerance to an already kept line are treated as rendering jitter of the
//! same separator and dropped.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::{BoundingBox, Line, TableKey};

use super::options::LineOptions;

/// Deduplicated separator lines of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLines {
    /// Horizontal lines, ascending y
    pub horizontal: Vec<Line>,
    /// Vertical lines, ascending x
    pub vertical: Vec<Line>,
}

impl GridLines {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }
}

/// Builds grid lines from cell boxes.
#[derive(Debug, Clone, Default)]
pub struct LineBuilder {
    options: LineOptions,
}

impl LineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LineOptions) -> Self {
        Self { options }
    }

    /// Derive merged horizontal and vertical lines from `cells`.
    ///
    /// Horizontal lines span the cells' full x extent, vertical lines their
    /// full y extent.
    pub fn build(&self, cells: &[BoundingBox]) -> GridLines {
        if cells.is_empty() {
            return GridLines::default();
        }

        let mut xs = BTreeSet::new();
        let mut ys = BTreeSet::new();
        for cell in cells {
            xs.insert(cell.x);
            xs.insert(cell.right());
            ys.insert(cell.y);
            ys.insert(cell.bottom());
        }

        // Both sets hold at least two values here.
        let (x_min, x_max) = (xs.first().copied().unwrap_or(0), xs.last().copied().unwrap_or(0));
        let (y_min, y_max) = (ys.first().copied().unwrap_or(0), ys.last().copied().unwrap_or(0));

        let horizontal = merge_positions(&ys, self.options.horizontal_tolerance)
            .into_iter()
            .map(|y| Line::horizontal(y, x_min, x_max))
            .collect();
        let vertical = merge_positions(&xs, self.options.vertical_tolerance)
            .into_iter()
            .map(|x| Line::vertical(x, y_min, y_max))
            .collect();

        GridLines {
            horizontal,
            vertical,
        }
    }

    /// Apply the grid gate: both axes need at least `min_lines_per_axis` lines.
    pub fn check(&self, key: &TableKey, lines: &GridLines) -> Result<()> {
        let min = self.options.min_lines_per_axis;
        if lines.horizontal.len() < min || lines.vertical.len() < min {
            return Err(Error::InsufficientGrid {
                table: key.to_string(),
                horizontal: lines.horizontal.len(),
                vertical: lines.vertical.len(),
            });
        }
        Ok(())
    }
}

/// Collapse positions that lie within `tolerance` of the last kept one.
///
/// Scans from the largest position down; the first position of each cluster
/// in that order survives. Returned ascending.
pub fn merge_positions(positions: &BTreeSet<u32>, tolerance: u32) -> Vec<u32> {
    let mut kept: Vec<u32> = Vec::with_capacity(positions.len());
    for &pos in positions.iter().rev() {
        match kept.last() {
            Some(&last) if last - pos < tolerance => {}
            _ => kept.push(pos),
        }
    }
    kept.reverse();
    kept
}
