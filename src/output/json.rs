//! JSON output for recovered ground truth.

use serde::Serialize;

use crate::error::Result;
use crate::model::DocumentTruth;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a value (usually a [`DocumentTruth`]) to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Parse a document's ground truth.
pub fn from_json(json: &str) -> Result<DocumentTruth> {
    Ok(serde_json::from_str(json)?)
}
