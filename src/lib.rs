//! # gridtruth
//!
//! Ground truth for table structure, recovered from color-coded renders.
//!
//! A document is rendered three times: with table borders in a marker
//! color, with the same borders in a second color, and with every cell
//! filled by its own unique color. The first two renders locate tables; the
//! third yields one box per cell, from which row and column separators are
//! derived. No document semantics are parsed; everything comes from pixels.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gridtruth::{locate_tables, recover_table, allocate, PageId};
//!
//! fn main() -> gridtruth::Result<()> {
//!     let page = PageId::new("report", 0);
//!     let located = locate_tables(&page, "fuchsia/report_0.png", "aqua/report_0.png")?;
//!
//!     let colors = allocate(1000, 0)?;
//!     let colored = image::open("cells/report_0.png")?.to_rgb8();
//!     for table in &located.tables {
//!         let crop = gridtruth::recover::crop(&colored, &table.bbox);
//!         let recovered = recover_table(&table.key, table.bbox, &crop, colors.colors(), 40)?;
//!         println!("{}: {} cells", table.key, recovered.cell_count());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Unique colors**: seeded, rejection-sampled over the full RGB space
//! - **Table localization**: structural similarity diff of two renders
//! - **Cell recovery**: exact-color masks, nested contours pruned
//! - **Grid lines**: tolerance-merged separators with a minimum-grid gate
//! - **Batch processing**: Rayon across documents, bounded external calls

pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod recover;

// Re-export commonly used types
pub use error::{Error, FailureCategory, Result};
pub use model::{
    contained, BoundingBox, Color, ColorTable, DocumentTruth, Line, Orientation, PageId, Table,
    TableKey, TableMap,
};
pub use output::{JsonFormat, OverlayKind};
pub use pipeline::{
    BatchReport, BatchRunner, DocumentHandles, DocumentPipeline, DocumentProvider, FsSink,
    MarkupInjector, MemorySink, PipelineOptions, Renderer, TruthSink,
};
pub use recover::{
    allocate, CellDetector, CellOptions, ColorAllocator, GridLines, LineBuilder, LineOptions,
    LocatedPage, LocatedTable, LocatorOptions, TableLocator,
};

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbImage;

/// Locate tables on a page from two border renders on disk.
///
/// # Arguments
///
/// * `page` - Page the renders belong to
/// * `marked` - Render with table borders in the marker color
/// * `second` - Render with table borders in the second color
///
/// # Example
///
/// ```no_run
/// use gridtruth::{locate_tables, PageId};
///
/// let located = locate_tables(&PageId::new("doc", 0), "a.png", "b.png").unwrap();
/// println!("Tables: {}", located.tables.len());
/// ```
pub fn locate_tables<P: AsRef<Path>, Q: AsRef<Path>>(
    page: &PageId,
    marked: P,
    second: Q,
) -> Result<LocatedPage> {
    let marked = image::open(marked)?.to_rgb8();
    let second = image::open(second)?.to_rgb8();
    TableLocator::new().locate(page, &marked, &second)
}

/// Locate tables with custom options.
pub fn locate_tables_with_options(
    page: &PageId,
    marked: &RgbImage,
    second: &RgbImage,
    options: LocatorOptions,
) -> Result<LocatedPage> {
    TableLocator::with_options(options).locate(page, marked, second)
}

/// Recover cell boxes from a table image with colored cells.
///
/// # Example
///
/// ```no_run
/// use gridtruth::{allocate, recover_cells};
///
/// let colors = allocate(100_000, 0).unwrap();
/// let table = image::open("table.png").unwrap().to_rgb8();
/// let cells = recover_cells(&table, colors.colors(), 24);
/// ```
pub fn recover_cells(table: &RgbImage, colors: &[Color], max_cells: usize) -> Vec<BoundingBox> {
    CellDetector::new().detect(table, colors, max_cells)
}

/// Derive merged grid lines from cell boxes.
pub fn build_lines(cells: &[BoundingBox]) -> GridLines {
    LineBuilder::new().build(cells)
}

/// Recover the full structure of one table and apply the grid gate.
///
/// `colored` is the table's crop from the colored-cells render.
pub fn recover_table(
    key: &TableKey,
    bbox: BoundingBox,
    colored: &RgbImage,
    colors: &[Color],
    max_cells: usize,
) -> Result<Table> {
    let cells = recover_cells(colored, colors, max_cells);
    let builder = LineBuilder::new();
    let lines = builder.build(&cells);
    builder.check(key, &lines)?;

    let mut table = Table::new(bbox);
    table.cells = cells;
    table.horizontal_lines = lines.horizontal;
    table.vertical_lines = lines.vertical;
    Ok(table)
}

/// Builder for configuring and running the pipeline.
///
/// # Example
///
/// ```no_run
/// use gridtruth::{Gridtruth, MemorySink};
/// use gridtruth::pipeline::{PrerenderedProvider, RenderDirs};
///
/// let dirs = RenderDirs {
///     marked: "a".into(),
///     second: "b".into(),
///     cells: "c".into(),
/// };
/// let sink = MemorySink::new();
/// let report = Gridtruth::new()
///     .with_seed(7)
///     .with_color_pool(5_000)
///     .sequential()
///     .runner()?
///     .run(&["doc".to_string()], &PrerenderedProvider::new(dirs, 30), &sink, |_| {});
/// # Ok::<(), gridtruth::Error>(())
/// ```
pub struct Gridtruth {
    options: PipelineOptions,
    scratch_root: PathBuf,
}

impl Gridtruth {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: PipelineOptions::default(),
            scratch_root: std::env::temp_dir().join("gridtruth"),
        }
    }

    /// Set the color allocation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.options = self.options.with_seed(seed);
        self
    }

    /// Set how many cell colors are allocated.
    pub fn with_color_pool(mut self, pool: usize) -> Self {
        self.options = self.options.with_color_pool(pool);
        self
    }

    /// Bound each external call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Persist cell and line overlays.
    pub fn with_debug_overlays(mut self) -> Self {
        self.options = self.options.with_debug_overlays(true);
        self
    }

    /// Skip documents that already have a record in the sink.
    pub fn resume(mut self) -> Self {
        self.options = self.options.with_skip_completed(true);
        self
    }

    /// Set table localization options.
    pub fn with_locator(mut self, options: LocatorOptions) -> Self {
        self.options = self.options.with_locator(options);
        self
    }

    /// Set line synthesis options.
    pub fn with_lines(mut self, options: LineOptions) -> Self {
        self.options = self.options.with_lines(options);
        self
    }

    /// Set cell recovery options.
    pub fn with_cells(mut self, options: CellOptions) -> Self {
        self.options = self.options.with_cells(options);
        self
    }

    /// Set where per-document scratch directories are created.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Pipeline for single documents.
    pub fn pipeline(&self) -> DocumentPipeline {
        DocumentPipeline::new(self.options.clone())
    }

    /// Allocate colors and build a batch runner.
    pub fn runner(self) -> Result<BatchRunner> {
        BatchRunner::new(self.options, self.scratch_root)
    }
}

impl Default for Gridtruth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gridtruth_builder() {
        let builder = Gridtruth::new()
            .with_seed(3)
            .with_color_pool(10)
            .sequential()
            .with_debug_overlays()
            .resume();

        assert_eq!(builder.options.color_seed, 3);
        assert_eq!(builder.options.color_pool, 10);
        assert!(!builder.options.parallel);
        assert!(builder.options.debug_overlays);
        assert!(builder.options.skip_completed);
    }

    #[test]
    fn test_gridtruth_builder_default() {
        let builder = Gridtruth::default();
        assert!(builder.options.parallel);
        assert_eq!(builder.options.lines.min_lines_per_axis, 3);
    }

    #[test]
    fn test_runner_allocates_pool() {
        let runner = Gridtruth::new().with_color_pool(25).runner().unwrap();
        assert_eq!(runner.colors().len(), 25);
    }

    #[test]
    fn test_locate_tables_missing_file() {
        let result = locate_tables(&PageId::new("doc", 0), "/nonexistent/a.png", "/nonexistent/b.png");
        assert!(result.is_err());
    }

    #[test]
    fn test_recover_table_gate() {
        let colors = allocate(4, 0).unwrap();
        let mut image = RgbImage::from_pixel(200, 100, image::Rgb([255, 255, 255]));
        // Single row of two cells: only 2 horizontal lines
        for (i, x0) in [0u32, 100].iter().enumerate() {
            for y in 0..100 {
                for x in *x0..x0 + 100 {
                    image.put_pixel(x, y, colors.colors()[i].to_rgb());
                }
            }
        }
        let key = PageId::new("doc", 0).table(0);
        let err = recover_table(&key, BoundingBox::new(0, 0, 200, 100), &image, colors.colors(), 2)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientGrid { horizontal: 2, vertical: 3, .. }));
    }

    #[test]
    fn test_build_lines_convenience() {
        let lines = build_lines(&[BoundingBox::new(0, 0, 100, 100)]);
        assert_eq!(lines.horizontal.len(), 2);
        assert_eq!(lines.vertical.len(), 2);
    }
}
