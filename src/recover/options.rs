//! Tunables for the recovery stages.

use crate::model::Color;

/// Options for locating tables from two border-color renders.
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Boxes with width or height at or below this are noise (pixels)
    pub min_side_px: u32,

    /// Boxes with both width and height below this are dropped (pixels)
    pub min_table_px: u32,

    /// Margin excluded from the validity check, presumed to hold the border
    pub border_margin_px: u32,

    /// Border color of the first render
    pub marker_color: Color,

    /// Border color of the second render
    pub second_color: Color,
}

impl LocatorOptions {
    /// Create new locator options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the noise floor for box sides.
    pub fn with_min_side(mut self, px: u32) -> Self {
        self.min_side_px = px;
        self
    }

    /// Set the small-fragment floor.
    pub fn with_min_table(mut self, px: u32) -> Self {
        self.min_table_px = px;
        self
    }

    /// Set the border margin for the validity check.
    pub fn with_border_margin(mut self, px: u32) -> Self {
        self.border_margin_px = px;
        self
    }

    /// Set both border marker colors.
    pub fn with_colors(mut self, marker: Color, second: Color) -> Self {
        self.marker_color = marker;
        self.second_color = second;
        self
    }
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            min_side_px: 10,
            min_table_px: 500,
            border_margin_px: 5,
            marker_color: Color::FUCHSIA,
            second_color: Color::AQUA,
        }
    }
}

/// Options for cell box recovery.
#[derive(Debug, Clone)]
pub struct CellOptions {
    /// Stop after this many consecutive absent colors
    pub absent_limit: usize,
}

impl CellOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the consecutive-absence limit.
    pub fn with_absent_limit(mut self, limit: usize) -> Self {
        self.absent_limit = limit.max(1);
        self
    }
}

impl Default for CellOptions {
    fn default() -> Self {
        Self { absent_limit: 50 }
    }
}

/// Options for grid line synthesis.
#[derive(Debug, Clone)]
pub struct LineOptions {
    /// Horizontal lines closer than this to the last kept one are merged (pixels)
    pub horizontal_tolerance: u32,

    /// Vertical lines closer than this to the last kept one are merged (pixels)
    pub vertical_tolerance: u32,

    /// Minimum lines per axis for a table to be accepted
    pub min_lines_per_axis: usize,
}

impl LineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both merge tolerances.
    pub fn with_tolerances(mut self, horizontal: u32, vertical: u32) -> Self {
        self.horizontal_tolerance = horizontal;
        self.vertical_tolerance = vertical;
        self
    }

    /// Set the grid gate.
    pub fn with_min_lines(mut self, lines: usize) -> Self {
        self.min_lines_per_axis = lines;
        self
    }
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            horizontal_tolerance: 25,
            vertical_tolerance: 20,
            min_lines_per_axis: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let locator = LocatorOptions::default();
        assert_eq!(locator.min_side_px, 10);
        assert_eq!(locator.min_table_px, 500);
        assert_eq!(locator.border_margin_px, 5);
        assert_eq!(locator.marker_color, Color::FUCHSIA);

        assert_eq!(CellOptions::default().absent_limit, 50);

        let lines = LineOptions::default();
        assert_eq!(lines.horizontal_tolerance, 25);
        assert_eq!(lines.vertical_tolerance, 20);
        assert_eq!(lines.min_lines_per_axis, 3);
    }

    #[test]
    fn test_options_builder() {
        let locator = LocatorOptions::new()
            .with_min_table(200)
            .with_border_margin(3)
            .with_colors(Color::new(1, 2, 3), Color::new(4, 5, 6));
        assert_eq!(locator.min_table_px, 200);
        assert_eq!(locator.border_margin_px, 3);
        assert_eq!(locator.second_color, Color::new(4, 5, 6));

        assert_eq!(CellOptions::new().with_absent_limit(0).absent_limit, 1);
        assert_eq!(LineOptions::new().with_tolerances(5, 6).vertical_tolerance, 6);
    }
}
