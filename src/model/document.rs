//! Document-level ground truth.

use super::{Table, TableKey, TableMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recovered structure for every accepted table of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTruth {
    /// Document identifier
    pub document: String,

    /// When the document finished processing
    pub processed_at: DateTime<Utc>,

    /// Number of cell colors the markup injector assigned to the largest table
    pub max_cell_count: usize,

    /// Accepted tables keyed by name
    pub tables: TableMap,
}

impl DocumentTruth {
    /// Create an empty result for a document.
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            processed_at: Utc::now(),
            max_cell_count: 0,
            tables: TableMap::new(),
        }
    }

    /// Get a table by key.
    pub fn table(&self, key: &TableKey) -> Option<&Table> {
        self.tables.get(key)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Total number of recovered cells across all tables.
    pub fn cell_count(&self) -> usize {
        self.tables.iter().map(|(_, t)| t.cell_count()).sum()
    }

    /// Check if no table was accepted.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
