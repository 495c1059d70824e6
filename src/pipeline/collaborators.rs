//! Interfaces to the external markup and rendering toolchain.
//!
//! The pipeline never edits documents or rasterizes pages itself. A
//! [`DocumentProvider`] opens a document into a [`MarkupInjector`] that
//! recolors it and a [`Renderer`] that rasterizes its current state.

use std::collections::BTreeMap;
use std::sync::Arc;

use image::RgbImage;

use super::workspace::Workspace;
use crate::error::Result;
use crate::model::Color;

/// Rendered pages keyed by zero-based page index.
pub type PageImages = BTreeMap<u32, RgbImage>;

/// Mutates a document's markup between renders.
pub trait MarkupInjector: Send + Sync {
    /// Draw every eligible table's outer border in `color`.
    ///
    /// Calling again with the same color must not change the result.
    fn draw_border(&self, color: Color) -> Result<()>;

    /// Give every cell of every eligible table its own background color.
    ///
    /// Cells take colors from `colors` in row-major order, restarting at the
    /// first color for each table. Table borders are drawn in the second
    /// border color. Returns the largest cell count of any table; 0 means no
    /// table was eligible. Tables with a single cell, nested tables or
    /// non-rectangular shape are not eligible.
    fn assign_cell_colors(&self, colors: &[Color]) -> Result<usize>;
}

/// Rasterizes a document in its current markup state.
pub trait Renderer: Send + Sync {
    /// Render every page. Failure applies to the whole document.
    fn render(&self) -> Result<PageImages>;
}

/// The collaborators for one open document.
#[derive(Clone)]
pub struct DocumentHandles {
    pub injector: Arc<dyn MarkupInjector>,
    pub renderer: Arc<dyn Renderer>,
}

impl DocumentHandles {
    pub fn new(injector: Arc<dyn MarkupInjector>, renderer: Arc<dyn Renderer>) -> Self {
        Self { injector, renderer }
    }

    /// Handles for a value implementing both traits.
    pub fn shared<T>(document: Arc<T>) -> Self
    where
        T: MarkupInjector + Renderer + 'static,
    {
        Self {
            injector: document.clone(),
            renderer: document,
        }
    }
}

impl std::fmt::Debug for DocumentHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandles").finish_non_exhaustive()
    }
}

/// Opens documents for processing.
pub trait DocumentProvider: Send + Sync {
    /// Open `document`, using `workspace` for any intermediate files.
    fn open(&self, document: &str, workspace: &Workspace) -> Result<DocumentHandles>;
}
