//! Per-document sequencing of the render triple and recovery stages.
//!
//! 1. Render with borders in the marker color (A) and the second color (B)
//! 2. Locate tables on every page from A/B
//! 3. Recolor cells and render again (C)
//! 4. Recover cells and lines per table from C, apply the grid gate
//! 5. Persist accepted tables
//!
//! Tables stay staged in memory until step 5, so a table that fails the
//! grid gate is dropped in one step and nothing of it ever reaches the sink.

use std::collections::BTreeMap;

use image::RgbImage;

use super::collaborators::{DocumentHandles, PageImages};
use super::options::PipelineOptions;
use super::sink::TruthSink;
use super::timeout::run_with_timeout;
use crate::error::{Error, Result};
use crate::model::{Color, DocumentTruth, PageId, Table, TableKey};
use crate::output::{draw_cell_boxes, draw_grid_lines, OverlayKind};
use crate::recover::{crop, CellDetector, LineBuilder, TableLocator};

/// A located table awaiting commit.
struct StagedTable {
    table: Table,
    /// Crop of the marker-color render
    image: RgbImage,
}

/// Runs the recovery pipeline for single documents.
#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    options: PipelineOptions,
    locator: TableLocator,
    detector: CellDetector,
    builder: LineBuilder,
}

impl DocumentPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            locator: TableLocator::with_options(options.locator.clone()),
            detector: CellDetector::with_options(options.cells.clone()),
            builder: LineBuilder::with_options(options.lines.clone()),
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Recover every table of `document` and persist the accepted ones.
    ///
    /// `colors` is the ordered cell color list handed to the injector.
    /// Table-level failures are logged and skipped; any other error aborts
    /// the document with nothing persisted.
    pub fn process(
        &self,
        document: &str,
        handles: &DocumentHandles,
        colors: &[Color],
        sink: &dyn TruthSink,
    ) -> Result<DocumentTruth> {
        let marker = self.options.locator.marker_color;
        let second = self.options.locator.second_color;

        let marked = self.render_with_border(handles, marker)?;
        let recolored = self.render_with_border(handles, second)?;
        let mut staged = self.locate_tables(document, &marked, &recolored)?;
        if staged.is_empty() {
            return Err(Error::NoTables);
        }
        log::info!("{}: located {} tables", document, staged.len());

        let max_cells = self.assign_cell_colors(handles, colors)?;
        if max_cells == 0 {
            return Err(Error::NoTables);
        }
        let colored = self.render(handles)?;

        self.recover_structure(&mut staged, &colored, colors, max_cells)?;

        let mut truth = DocumentTruth::new(document);
        truth.max_cell_count = max_cells;
        self.commit(&mut truth, staged, sink)?;
        log::info!(
            "{}: kept {} tables, {} cells",
            document,
            truth.table_count(),
            truth.cell_count()
        );
        Ok(truth)
    }

    fn render_with_border(&self, handles: &DocumentHandles, color: Color) -> Result<PageImages> {
        let injector = handles.injector.clone();
        run_with_timeout("draw_border", self.options.stage_timeout, move || {
            injector.draw_border(color)
        })?;
        self.render(handles)
    }

    fn assign_cell_colors(&self, handles: &DocumentHandles, colors: &[Color]) -> Result<usize> {
        let injector = handles.injector.clone();
        let colors = colors.to_vec();
        run_with_timeout("assign_cell_colors", self.options.stage_timeout, move || {
            injector.assign_cell_colors(&colors)
        })
    }

    fn render(&self, handles: &DocumentHandles) -> Result<PageImages> {
        let renderer = handles.renderer.clone();
        let pages = run_with_timeout("render", self.options.stage_timeout, move || {
            renderer.render()
        })?;
        if pages.is_empty() {
            return Err(Error::external("render", "no pages rendered"));
        }
        Ok(pages)
    }

    fn locate_tables(
        &self,
        document: &str,
        marked: &PageImages,
        recolored: &PageImages,
    ) -> Result<BTreeMap<TableKey, StagedTable>> {
        if marked.len() != recolored.len() {
            return Err(Error::RenderMismatch(format!(
                "{} pages with marker borders, {} with second borders",
                marked.len(),
                recolored.len()
            )));
        }

        let mut staged = BTreeMap::new();
        for (&page, image_a) in marked {
            let image_b = recolored.get(&page).ok_or_else(|| {
                Error::RenderMismatch(format!("page {} missing from second render", page))
            })?;
            let page_id = PageId::new(document, page);
            for located in self.locator.locate(&page_id, image_a, image_b)?.tables {
                let image = crop(image_a, &located.bbox);
                staged.insert(
                    located.key,
                    StagedTable {
                        table: Table::new(located.bbox),
                        image,
                    },
                );
            }
        }
        Ok(staged)
    }

    fn recover_structure(
        &self,
        staged: &mut BTreeMap<TableKey, StagedTable>,
        colored: &PageImages,
        colors: &[Color],
        max_cells: usize,
    ) -> Result<()> {
        let keys: Vec<TableKey> = staged.keys().cloned().collect();
        for key in keys {
            let page = colored.get(&key.page.page).ok_or_else(|| {
                Error::RenderMismatch(format!("page {} missing from cell render", key.page.page))
            })?;
            let Some(entry) = staged.get_mut(&key) else {
                continue;
            };

            let colored_table = crop(page, &entry.table.bbox);
            let cells = self.detector.detect(&colored_table, colors, max_cells);
            let lines = self.builder.build(&cells);
            match self.builder.check(&key, &lines) {
                Ok(()) => {}
                Err(e) if e.is_table_level() => {
                    log::warn!("{}", e);
                    staged.remove(&key);
                    continue;
                }
                Err(e) => return Err(e),
            }

            entry.table.cells = cells;
            entry.table.horizontal_lines = lines.horizontal;
            entry.table.vertical_lines = lines.vertical;
        }
        Ok(())
    }

    /// Persist staged tables, then the document. On failure, remove what
    /// was already written.
    fn commit(
        &self,
        truth: &mut DocumentTruth,
        staged: BTreeMap<TableKey, StagedTable>,
        sink: &dyn TruthSink,
    ) -> Result<()> {
        let mut written = Vec::with_capacity(staged.len());
        let result = (|| -> Result<()> {
            for (key, entry) in staged {
                written.push(key.clone());
                sink.save_table_image(&key, &entry.image)?;
                if self.options.debug_overlays {
                    let cells = draw_cell_boxes(&entry.image, &entry.table.cells);
                    sink.save_overlay(OverlayKind::Cells, &key, &cells)?;
                    let lines = draw_grid_lines(&entry.image, &entry.table);
                    sink.save_overlay(OverlayKind::Lines, &key, &lines)?;
                }
                truth.tables.insert(key, entry.table);
            }
            sink.save_document(truth)
        })();

        if let Err(e) = result {
            if let Err(cleanup) = sink.discard_tables(&written) {
                log::error!("{}: rollback incomplete: {}", truth.document, cleanup);
            }
            truth.tables = Default::default();
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::collaborators::{MarkupInjector, Renderer};
    use crate::pipeline::sink::MemorySink;
    use std::sync::Arc;

    struct Failing;

    impl MarkupInjector for Failing {
        fn draw_border(&self, _color: Color) -> Result<()> {
            Ok(())
        }

        fn assign_cell_colors(&self, _colors: &[Color]) -> Result<usize> {
            Ok(0)
        }
    }

    impl Renderer for Failing {
        fn render(&self) -> Result<PageImages> {
            Err(Error::external("render", "converter exited with status 1"))
        }
    }

    struct Blank;

    impl MarkupInjector for Blank {
        fn draw_border(&self, _color: Color) -> Result<()> {
            Ok(())
        }

        fn assign_cell_colors(&self, _colors: &[Color]) -> Result<usize> {
            Ok(0)
        }
    }

    impl Renderer for Blank {
        fn render(&self) -> Result<PageImages> {
            Ok([(0, RgbImage::from_pixel(64, 64, image::Rgb([255, 255, 255])))].into())
        }
    }

    #[test]
    fn test_render_failure_aborts_document() {
        let pipeline = DocumentPipeline::new(PipelineOptions::default());
        let sink = MemorySink::new();
        let err = pipeline
            .process("doc", &DocumentHandles::shared(Arc::new(Failing)), &[], &sink)
            .unwrap_err();
        assert!(matches!(err, Error::ExternalStageFailure { .. }));
        assert!(sink.table_keys().is_empty());
    }

    #[test]
    fn test_blank_document_has_no_tables() {
        let pipeline = DocumentPipeline::new(PipelineOptions::default());
        let sink = MemorySink::new();
        let err = pipeline
            .process("doc", &DocumentHandles::shared(Arc::new(Blank)), &[], &sink)
            .unwrap_err();
        assert!(matches!(err, Error::NoTables));
        assert!(sink.document("doc").is_none());
    }
}
