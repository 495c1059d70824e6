//! Page-pixel geometry: boxes and grid lines.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in page-pixel coordinates.
///
/// The right and bottom edges are exclusive: a box at `x` with width `w`
/// covers columns `x..x + w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels (> 0)
    pub width: u32,
    /// Height in pixels (> 0)
    pub height: u32,
}

impl BoundingBox {
    /// Create a new box.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box covering every point, inclusive of the extreme pixels.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether this box lies inside `outer`, edges inclusive.
    pub fn is_within(&self, outer: &BoundingBox) -> bool {
        self.x >= outer.x
            && self.right() <= outer.right()
            && self.y >= outer.y
            && self.bottom() <= outer.bottom()
    }

    /// Shrink the box by `margin` on every side.
    ///
    /// Returns `None` when nothing is left.
    pub fn inset(&self, margin: u32) -> Option<BoundingBox> {
        let width = self.width.checked_sub(margin * 2)?;
        let height = self.height.checked_sub(margin * 2)?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self::new(self.x + margin, self.y + margin, width, height))
    }
}

/// Check if `inner` is inside `outer`, edges inclusive.
pub fn contained(inner: &BoundingBox, outer: &BoundingBox) -> bool {
    inner.is_within(outer)
}

/// Direction of a grid line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Constant y
    Horizontal,
    /// Constant x
    Vertical,
}

/// A separator line given by its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Line {
    /// Horizontal line at `y` from `x_min` to `x_max`.
    pub fn horizontal(y: u32, x_min: u32, x_max: u32) -> Self {
        Self {
            x1: x_min,
            y1: y,
            x2: x_max,
            y2: y,
        }
    }

    /// Vertical line at `x` from `y_min` to `y_max`.
    pub fn vertical(x: u32, y_min: u32, y_max: u32) -> Self {
        Self {
            x1: x,
            y1: y_min,
            x2: x,
            y2: y_max,
        }
    }

    pub fn orientation(&self) -> Orientation {
        if self.y1 == self.y2 && self.x1 != self.x2 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    /// Position on the perpendicular axis (y for horizontal, x for vertical).
    pub fn position(&self) -> u32 {
        match self.orientation() {
            Orientation::Horizontal => self.y1,
            Orientation::Vertical => self.x1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contained_inclusive_edges() {
        let outer = BoundingBox::new(0, 0, 100, 100);
        assert!(contained(&BoundingBox::new(10, 10, 20, 20), &outer));
        assert!(contained(&BoundingBox::new(0, 0, 100, 100), &outer));
        assert!(contained(&BoundingBox::new(0, 50, 100, 50), &outer));
    }

    #[test]
    fn test_not_contained_when_edge_exceeds() {
        let outer = BoundingBox::new(10, 10, 100, 100);
        assert!(!contained(&BoundingBox::new(9, 10, 20, 20), &outer));
        assert!(!contained(&BoundingBox::new(10, 9, 20, 20), &outer));
        assert!(!contained(&BoundingBox::new(10, 10, 101, 20), &outer));
        assert!(!contained(&BoundingBox::new(10, 10, 20, 101), &outer));
    }

    #[test]
    fn test_from_points_is_inclusive() {
        let bbox = BoundingBox::from_points([(5, 7), (9, 3), (6, 6)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(5, 3, 5, 5));
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_inset() {
        let bbox = BoundingBox::new(100, 200, 50, 40);
        assert_eq!(bbox.inset(5), Some(BoundingBox::new(105, 205, 40, 30)));
        assert_eq!(BoundingBox::new(0, 0, 10, 30).inset(5), None);
        assert_eq!(BoundingBox::new(0, 0, 8, 30).inset(5), None);
    }

    #[test]
    fn test_line_position() {
        let h = Line::horizontal(40, 0, 300);
        let v = Line::vertical(12, 0, 200);
        assert_eq!(h.orientation(), Orientation::Horizontal);
        assert_eq!(h.position(), 40);
        assert_eq!(v.orientation(), Orientation::Vertical);
        assert_eq!(v.position(), 12);
    }
}
