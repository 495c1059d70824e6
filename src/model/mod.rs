//! Data model for recovered table structure.
//!
//! Everything here is produced and consumed while processing a single
//! document; nothing is shared across tables or documents.

mod color;
mod document;
mod geometry;
mod table;

pub use color::{Color, ColorTable};
pub use document::DocumentTruth;
pub use geometry::{contained, BoundingBox, Line, Orientation};
pub use table::{PageId, Table, TableKey, TableMap};
