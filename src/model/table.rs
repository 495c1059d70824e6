//! Table types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{BoundingBox, Line};
use crate::error::{Error, Result};

/// A rendered page, addressed by document id and zero-based page index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId {
    /// Document identifier
    pub document: String,
    /// Zero-based page index
    pub page: u32,
}

impl PageId {
    pub fn new(document: impl Into<String>, page: u32) -> Self {
        Self {
            document: document.into(),
            page,
        }
    }

    /// Key for the table at `index` in this page's top-to-bottom order.
    pub fn table(&self, index: usize) -> TableKey {
        TableKey {
            page: self.clone(),
            index,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.document, self.page)
    }
}

/// Table name: `<document>_<page>_<index>`.
///
/// Ordering follows document, then page, then top-to-bottom position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TableKey {
    /// Page the table was located on
    pub page: PageId,
    /// Position in the page's top-to-bottom order
    pub index: usize,
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.page, self.index)
    }
}

impl FromStr for TableKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTableKey(s.to_string());
        let mut parts = s.rsplitn(3, '_');
        let index = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let page = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let document = parts.next().filter(|d| !d.is_empty()).ok_or_else(invalid)?;
        Ok(PageId::new(document, page).table(index))
    }
}

impl From<TableKey> for String {
    fn from(key: TableKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for TableKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A recovered table: its extent on the page plus the structure found inside.
///
/// Cell boxes and lines are in the coordinates of the cropped table image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Extent on the rendered page
    pub bbox: BoundingBox,

    /// Cell boxes in color allocation order
    pub cells: Vec<BoundingBox>,

    /// Horizontal separator lines, ascending y
    pub horizontal_lines: Vec<Line>,

    /// Vertical separator lines, ascending x
    pub vertical_lines: Vec<Line>,
}

impl Table {
    /// Create a table with a located extent and no structure yet.
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            cells: Vec::new(),
            horizontal_lines: Vec::new(),
            vertical_lines: Vec::new(),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of rows implied by the horizontal lines.
    pub fn row_count(&self) -> usize {
        self.horizontal_lines.len().saturating_sub(1)
    }

    /// Number of columns implied by the vertical lines.
    pub fn column_count(&self) -> usize {
        self.vertical_lines.len().saturating_sub(1)
    }
}

/// Tables of one document keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableMap {
    tables: BTreeMap<TableKey, Table>,
}

impl TableMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: TableKey, table: Table) -> Option<Table> {
        self.tables.insert(key, table)
    }

    pub fn get(&self, key: &TableKey) -> Option<&Table> {
        self.tables.get(key)
    }

    pub fn remove(&mut self, key: &TableKey) -> Option<Table> {
        self.tables.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TableKey> {
        self.tables.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableKey, &Table)> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<(TableKey, Table)> for TableMap {
    fn from_iter<I: IntoIterator<Item = (TableKey, Table)>>(iter: I) -> Self {
        Self {
            tables: iter.into_iter().collect(),
        }
    }
}
