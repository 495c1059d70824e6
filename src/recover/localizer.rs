//! Table localization from two renders that differ only in border color.
//!
//! The page is rendered once with every table border in the marker color
//! and once in a second color. Wherever the two renders disagree there is a
//! table border: the similarity map is thresholded, and the outer contour of
//! each disagreement ring gives the table's extent.

use image::{imageops, RgbImage};

use crate::error::{Error, Result};
use crate::model::{BoundingBox, PageId, TableKey};

use super::options::LocatorOptions;
use super::segment::{contains_color, external_boxes, threshold_inverted};
use super::similarity::structural_similarity;

/// A table region found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedTable {
    /// Page id plus position in top-to-bottom order
    pub key: TableKey,
    /// Extent on the page
    pub bbox: BoundingBox,
}

/// Result of localizing one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatedPage {
    /// Accepted tables, top to bottom
    pub tables: Vec<LocatedTable>,

    /// Regions rejected as nested or non-rectangular.
    ///
    /// They keep their index, so accepted keys may have gaps.
    pub rejected: Vec<LocatedTable>,
}

impl LocatedPage {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Locates tables on a page from a pair of border renders.
#[derive(Debug, Clone, Default)]
pub struct TableLocator {
    options: LocatorOptions,
}

impl TableLocator {
    /// Create a locator with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a locator with custom options.
    pub fn with_options(options: LocatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Locate the tables of `page`.
    ///
    /// `marked` has table borders in the marker color, `second` the same
    /// borders in the second color. Identical renders mean the page has no
    /// table and yield an empty result.
    pub fn locate(&self, page: &PageId, marked: &RgbImage, second: &RgbImage) -> Result<LocatedPage> {
        let gray_marked = imageops::grayscale(marked);
        let gray_second = imageops::grayscale(second);

        let similarity = structural_similarity(&gray_marked, &gray_second)?;
        if similarity.is_identical() {
            log::debug!("Page {}: renders identical, no tables", page);
            return Ok(LocatedPage::default());
        }

        let (mask, level) = threshold_inverted(&similarity.to_gray());
        let candidates = external_boxes(&mask);
        log::debug!(
            "Page {}: similarity {:.4}, threshold {}, {} contours",
            page,
            similarity.score,
            level,
            candidates.len()
        );

        let mut boxes = self.filter_by_size(candidates);
        boxes.sort_by_key(|b| b.y);

        let mut located = LocatedPage::default();
        for (index, bbox) in boxes.into_iter().enumerate() {
            let table = LocatedTable {
                key: page.table(index),
                bbox,
            };
            match self.validate(&table, marked) {
                Ok(()) => located.tables.push(table),
                Err(e) if e.is_table_level() => {
                    log::warn!("{}", e);
                    located.rejected.push(table);
                }
                Err(e) => return Err(e),
            }
        }

        log::debug!(
            "Page {}: {} tables accepted, {} rejected",
            page,
            located.tables.len(),
            located.rejected.len()
        );
        Ok(located)
    }

    /// Drop noise and small fragments.
    fn filter_by_size(&self, boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
        let opts = &self.options;
        boxes
            .into_iter()
            .filter(|b| {
                if b.width <= opts.min_side_px || b.height <= opts.min_side_px {
                    return false;
                }
                if b.width < opts.min_table_px && b.height < opts.min_table_px {
                    log::debug!("Dropping small fragment {:?}", b);
                    return false;
                }
                true
            })
            .collect()
    }

    /// A table whose interior still shows the marker color is nested or
    /// not a rectangle.
    fn validate(&self, table: &LocatedTable, marked: &RgbImage) -> Result<()> {
        let inner = table.bbox.inset(self.options.border_margin_px);
        let marker_inside = inner
            .map(|region| contains_color(marked, &region, self.options.marker_color))
            .unwrap_or(false);
        if marker_inside {
            return Err(Error::InvalidTableShape(table.key.to_string()));
        }
        Ok(())
    }
}
