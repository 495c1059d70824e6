//! Collaborators backed by page images rendered ahead of time.
//!
//! Each render of the triple lives in its own directory, with one file per
//! page named `<document>_<page>.png`. Drawing a border or assigning cell
//! colors only selects which directory the next render reads from.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use regex::Regex;

use super::collaborators::{DocumentHandles, DocumentProvider, MarkupInjector, PageImages, Renderer};
use super::workspace::Workspace;
use crate::error::{Error, Result};
use crate::model::Color;

/// Directories holding the three renders.
#[derive(Debug, Clone)]
pub struct RenderDirs {
    /// Borders in the marker color
    pub marked: PathBuf,
    /// Borders in the second color
    pub second: PathBuf,
    /// Cells colored
    pub cells: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Unmarked,
    Marked,
    Second,
    Cells,
}

/// One pre-rendered document.
#[derive(Debug)]
pub struct PrerenderedDocument {
    document: String,
    dirs: RenderDirs,
    marker: Color,
    second: Color,
    max_cells: usize,
    stage: Mutex<Stage>,
}

impl PrerenderedDocument {
    /// `max_cells` is what the cell coloring reported when the renders were
    /// made.
    pub fn new(document: impl Into<String>, dirs: RenderDirs, max_cells: usize) -> Self {
        Self {
            document: document.into(),
            dirs,
            marker: Color::FUCHSIA,
            second: Color::AQUA,
            max_cells,
            stage: Mutex::new(Stage::Unmarked),
        }
    }

    /// Border colors the two border renders were made with.
    pub fn with_border_colors(mut self, marker: Color, second: Color) -> Self {
        self.marker = marker;
        self.second = second;
        self
    }

    fn set_stage(&self, stage: Stage) {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner()) = stage;
    }

    fn stage(&self) -> Stage {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MarkupInjector for PrerenderedDocument {
    fn draw_border(&self, color: Color) -> Result<()> {
        let stage = if color == self.marker {
            Stage::Marked
        } else if color == self.second {
            Stage::Second
        } else {
            return Err(Error::external(
                "draw_border",
                format!("no pre-rendered pages with {} borders", color),
            ));
        };
        self.set_stage(stage);
        Ok(())
    }

    fn assign_cell_colors(&self, _colors: &[Color]) -> Result<usize> {
        self.set_stage(Stage::Cells);
        Ok(self.max_cells)
    }
}

impl Renderer for PrerenderedDocument {
    fn render(&self) -> Result<PageImages> {
        let dir = match self.stage() {
            Stage::Marked => &self.dirs.marked,
            Stage::Second => &self.dirs.second,
            Stage::Cells => &self.dirs.cells,
            Stage::Unmarked => {
                return Err(Error::external("render", "no unmarked render available"))
            }
        };
        load_pages(dir, &self.document)
    }
}

/// Load every `<document>_<page>.png` in `dir`.
pub fn load_pages(dir: &Path, document: &str) -> Result<PageImages> {
    let pattern = Regex::new(&format!(r"^{}_(\d+)\.png$", regex::escape(document)))
        .map_err(|e| Error::Other(e.to_string()))?;

    let mut pages = PageImages::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(page) = pattern
            .captures(name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        else {
            continue;
        };
        let image = image::open(&path)
            .map_err(|e| Error::external("render", format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        pages.insert(page, image);
    }

    if pages.is_empty() {
        return Err(Error::external(
            "render",
            format!("no pages for {} in {}", document, dir.display()),
        ));
    }
    log::debug!("Loaded {} pages of {} from {}", pages.len(), document, dir.display());
    Ok(pages)
}

/// Opens [`PrerenderedDocument`]s from a shared set of directories.
#[derive(Debug, Clone)]
pub struct PrerenderedProvider {
    dirs: RenderDirs,
    default_max_cells: usize,
    max_cells: HashMap<String, usize>,
    marker: Color,
    second: Color,
}

impl PrerenderedProvider {
    pub fn new(dirs: RenderDirs, default_max_cells: usize) -> Self {
        Self {
            dirs,
            default_max_cells,
            max_cells: HashMap::new(),
            marker: Color::FUCHSIA,
            second: Color::AQUA,
        }
    }

    /// Set the max cell count of a single document.
    pub fn with_max_cells(mut self, document: impl Into<String>, max_cells: usize) -> Self {
        self.max_cells.insert(document.into(), max_cells);
        self
    }

    pub fn with_border_colors(mut self, marker: Color, second: Color) -> Self {
        self.marker = marker;
        self.second = second;
        self
    }
}

impl DocumentProvider for PrerenderedProvider {
    fn open(&self, document: &str, _workspace: &Workspace) -> Result<DocumentHandles> {
        let max_cells = self
            .max_cells
            .get(document)
            .copied()
            .unwrap_or(self.default_max_cells);
        let doc = PrerenderedDocument::new(document, self.dirs.clone(), max_cells)
            .with_border_colors(self.marker, self.second);
        Ok(DocumentHandles::shared(Arc::new(doc)))
    }
}
