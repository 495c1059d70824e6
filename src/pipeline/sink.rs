//! Persistence of recovered ground truth and per-document outcome logs.

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use image::RgbImage;

use crate::error::{Error, FailureCategory, Result};
use crate::model::{DocumentTruth, TableKey};
use crate::output::{to_json, JsonFormat, OverlayKind};

use super::workspace::encode_name;

/// Log of successfully processed documents.
pub const PROCESSED_LOG: &str = "processed.csv";

/// A document-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub document: String,
    pub category: FailureCategory,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl FailureRecord {
    /// Record `error` against `document`, timestamped now.
    pub fn new(document: impl Into<String>, error: &Error) -> Self {
        Self {
            document: document.into(),
            category: error.category(),
            message: error.to_string(),
            at: Utc::now(),
        }
    }
}

/// Destination for recovered tables and outcome records.
///
/// Implementations are shared between workers and must serialize their own
/// writes.
pub trait TruthSink: Send + Sync {
    /// Persist the cropped image of an accepted table.
    fn save_table_image(&self, key: &TableKey, image: &RgbImage) -> Result<()>;

    /// Persist a debug overlay for an accepted table.
    fn save_overlay(&self, kind: OverlayKind, key: &TableKey, image: &RgbImage) -> Result<()>;

    /// Remove every artifact persisted for these tables.
    fn discard_tables(&self, keys: &[TableKey]) -> Result<()>;

    /// Persist a document's table map.
    fn save_document(&self, truth: &DocumentTruth) -> Result<()>;

    /// Append a success record.
    fn record_success(&self, document: &str, message: &str) -> Result<()>;

    /// Append a failure record to its category's log.
    fn record_failure(&self, record: &FailureRecord) -> Result<()>;

    /// Documents that already have a success or failure record.
    fn completed_documents(&self) -> Result<HashSet<String>> {
        Ok(HashSet::new())
    }
}

/// Sink writing into an output directory.
///
/// Document ids and table keys are percent-encoded into file names, so any
/// id maps to its own file inside the directory.
///
/// ```text
/// <root>/tables/<key>.png
/// <root>/truth/<document>.json
/// <root>/overlays/{cells,lines}/<key>.png
/// <root>/processed.csv, <root>/<category>_failed.csv, <root>/no_tables.csv
/// ```
#[derive(Debug)]
pub struct FsSink {
    root: PathBuf,
    format: JsonFormat,
    log_lock: Mutex<()>,
}

impl FsSink {
    /// Open (creating if needed) an output directory.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("tables"))?;
        fs::create_dir_all(root.join("truth"))?;
        Ok(Self {
            root,
            format: JsonFormat::Pretty,
            log_lock: Mutex::new(()),
        })
    }

    /// Set the JSON layout of truth files.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, key: &TableKey) -> PathBuf {
        self.root
            .join("tables")
            .join(format!("{}.png", encode_name(&key.to_string())))
    }

    pub fn truth_path(&self, document: &str) -> PathBuf {
        self.root
            .join("truth")
            .join(format!("{}.json", encode_name(document)))
    }

    pub fn overlay_path(&self, kind: OverlayKind, key: &TableKey) -> PathBuf {
        self.root
            .join("overlays")
            .join(kind.dir_name())
            .join(format!("{}.png", encode_name(&key.to_string())))
    }

    /// Load a previously saved document.
    pub fn load_document(&self, document: &str) -> Result<DocumentTruth> {
        let text = fs::read_to_string(self.truth_path(document))?;
        crate::output::from_json(&text)
    }

    /// Append the record `<document>,<timestamp>,<message>` to a log file.
    fn append(&self, file_name: &str, document: &str, at: DateTime<Utc>, message: &str) -> Result<()> {
        let _guard = self.log_lock.lock().unwrap_or_else(|e| e.into_inner());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(file_name))?;
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.write_record([
            document,
            at.to_rfc3339_opts(SecondsFormat::Secs, true).as_str(),
            message,
        ])?;
        wtr.flush()?;
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl TruthSink for FsSink {
    fn save_table_image(&self, key: &TableKey, image: &RgbImage) -> Result<()> {
        image.save(self.table_path(key))?;
        Ok(())
    }

    fn save_overlay(&self, kind: OverlayKind, key: &TableKey, image: &RgbImage) -> Result<()> {
        let path = self.overlay_path(kind, key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        image.save(path)?;
        Ok(())
    }

    fn discard_tables(&self, keys: &[TableKey]) -> Result<()> {
        let mut first_error = None;
        for key in keys {
            let paths = [
                self.table_path(key),
                self.overlay_path(OverlayKind::Cells, key),
                self.overlay_path(OverlayKind::Lines, key),
            ];
            for path in paths {
                if let Err(e) = remove_if_present(&path) {
                    log::warn!("Failed to remove {}: {}", path.display(), e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn save_document(&self, truth: &DocumentTruth) -> Result<()> {
        let json = to_json(truth, self.format)?;
        fs::write(self.truth_path(&truth.document), json)?;
        Ok(())
    }

    fn record_success(&self, document: &str, message: &str) -> Result<()> {
        self.append(PROCESSED_LOG, document, Utc::now(), message)
    }

    fn record_failure(&self, record: &FailureRecord) -> Result<()> {
        self.append(
            &record.category.log_file_name(),
            &record.document,
            record.at,
            &record.message,
        )
    }

    fn completed_documents(&self) -> Result<HashSet<String>> {
        let mut done = HashSet::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&path)?;
            for record in rdr.records() {
                if let Some(document) = record?.get(0).filter(|d| !d.is_empty()) {
                    done.insert(document.to_string());
                }
            }
        }
        Ok(done)
    }
}

#[derive(Debug, Default)]
struct MemoryRecords {
    tables: BTreeMap<TableKey, RgbImage>,
    overlays: BTreeMap<(OverlayKind, TableKey), RgbImage>,
    documents: BTreeMap<String, DocumentTruth>,
    successes: Vec<String>,
    failures: Vec<FailureRecord>,
}

/// Sink keeping everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<MemoryRecords>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_records<T>(&self, f: impl FnOnce(&mut MemoryRecords) -> T) -> T {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut records)
    }

    /// Keys of saved table images.
    pub fn table_keys(&self) -> Vec<TableKey> {
        self.with_records(|r| r.tables.keys().cloned().collect())
    }

    pub fn table_image(&self, key: &TableKey) -> Option<RgbImage> {
        self.with_records(|r| r.tables.get(key).cloned())
    }

    pub fn overlay(&self, kind: OverlayKind, key: &TableKey) -> Option<RgbImage> {
        self.with_records(|r| r.overlays.get(&(kind, key.clone())).cloned())
    }

    pub fn document(&self, document: &str) -> Option<DocumentTruth> {
        self.with_records(|r| r.documents.get(document).cloned())
    }

    pub fn successes(&self) -> Vec<String> {
        self.with_records(|r| r.successes.clone())
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.with_records(|r| r.failures.clone())
    }
}

impl TruthSink for MemorySink {
    fn save_table_image(&self, key: &TableKey, image: &RgbImage) -> Result<()> {
        self.with_records(|r| r.tables.insert(key.clone(), image.clone()));
        Ok(())
    }

    fn save_overlay(&self, kind: OverlayKind, key: &TableKey, image: &RgbImage) -> Result<()> {
        self.with_records(|r| r.overlays.insert((kind, key.clone()), image.clone()));
        Ok(())
    }

    fn discard_tables(&self, keys: &[TableKey]) -> Result<()> {
        self.with_records(|r| {
            for key in keys {
                r.tables.remove(key);
                r.overlays.retain(|(_, k), _| k != key);
            }
        });
        Ok(())
    }

    fn save_document(&self, truth: &DocumentTruth) -> Result<()> {
        self.with_records(|r| r.documents.insert(truth.document.clone(), truth.clone()));
        Ok(())
    }

    fn record_success(&self, document: &str, _message: &str) -> Result<()> {
        self.with_records(|r| r.successes.push(document.to_string()));
        Ok(())
    }

    fn record_failure(&self, record: &FailureRecord) -> Result<()> {
        self.with_records(|r| r.failures.push(record.clone()));
        Ok(())
    }

    fn completed_documents(&self) -> Result<HashSet<String>> {
        Ok(self.with_records(|r| {
            r.successes
                .iter()
                .cloned()
                .chain(r.failures.iter().map(|f| f.document.clone()))
                .collect()
        }))
    }
}
