//! Batch processing of many documents.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::collaborators::DocumentProvider;
use super::coordinator::DocumentPipeline;
use super::options::PipelineOptions;
use super::sink::{FailureRecord, TruthSink};
use super::workspace::Workspace;
use crate::error::{FailureCategory, Result};
use crate::model::{ColorTable, DocumentTruth};
use crate::recover::ColorAllocator;

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Tables were recovered and persisted
    Succeeded {
        document: String,
        tables: usize,
        cells: usize,
    },
    /// The document was aborted
    Failed {
        document: String,
        category: FailureCategory,
        message: String,
    },
    /// The sink already had a record for the document
    Skipped { document: String },
}

impl DocumentOutcome {
    pub fn document(&self) -> &str {
        match self {
            DocumentOutcome::Succeeded { document, .. }
            | DocumentOutcome::Failed { document, .. }
            | DocumentOutcome::Skipped { document } => document,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DocumentOutcome::Succeeded { .. })
    }
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Outcomes in input order
    pub outcomes: Vec<DocumentOutcome>,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DocumentOutcome::Failed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DocumentOutcome::Skipped { .. }))
            .count()
    }

    /// Failure counts per category.
    pub fn failures_by_category(&self) -> Vec<(FailureCategory, usize)> {
        FailureCategory::ALL
            .iter()
            .map(|&category| {
                let count = self
                    .outcomes
                    .iter()
                    .filter(|o| matches!(o, DocumentOutcome::Failed { category: c, .. } if *c == category))
                    .count();
                (category, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}

/// Runs the pipeline over a list of documents, one per worker.
///
/// Cell colors are allocated once for the whole batch.
pub struct BatchRunner {
    pipeline: DocumentPipeline,
    colors: ColorTable,
    scratch_root: PathBuf,
}

impl BatchRunner {
    /// Allocate the batch's colors and prepare the pipeline.
    pub fn new(options: PipelineOptions, scratch_root: impl Into<PathBuf>) -> Result<Self> {
        let colors = ColorAllocator::new(options.color_seed).allocate(options.color_pool)?;
        Ok(Self::with_colors(options, colors.into(), scratch_root))
    }

    /// Use an existing color table instead of allocating one.
    pub fn with_colors(
        options: PipelineOptions,
        colors: ColorTable,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pipeline: DocumentPipeline::new(options),
            colors,
            scratch_root: scratch_root.into(),
        }
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Process every document, reporting each outcome to `progress` as it
    /// completes.
    pub fn run<F>(
        &self,
        documents: &[String],
        provider: &dyn DocumentProvider,
        sink: &dyn TruthSink,
        progress: F,
    ) -> BatchReport
    where
        F: Fn(&DocumentOutcome) + Sync,
    {
        let start = Instant::now();
        let completed = if self.pipeline.options().skip_completed {
            sink.completed_documents().unwrap_or_else(|e| {
                log::warn!("Could not read completed documents: {}", e);
                HashSet::new()
            })
        } else {
            HashSet::new()
        };

        let handle = |document: &String| {
            let outcome = if completed.contains(document) {
                DocumentOutcome::Skipped {
                    document: document.clone(),
                }
            } else {
                self.run_document(document, provider, sink)
            };
            progress(&outcome);
            outcome
        };

        let outcomes = if self.pipeline.options().parallel {
            documents.par_iter().map(handle).collect()
        } else {
            documents.iter().map(handle).collect()
        };

        let report = BatchReport {
            outcomes,
            elapsed: start.elapsed(),
        };
        log::info!(
            "Batch done in {:?}: {} succeeded, {} failed, {} skipped",
            report.elapsed,
            report.succeeded(),
            report.failed(),
            report.skipped()
        );
        report
    }

    /// Process a single document and record its outcome in the sink.
    pub fn run_document(
        &self,
        document: &str,
        provider: &dyn DocumentProvider,
        sink: &dyn TruthSink,
    ) -> DocumentOutcome {
        match self.process(document, provider, sink) {
            Ok(truth) => {
                let message = format!("{} tables; {} cells", truth.table_count(), truth.cell_count());
                if let Err(e) = sink.record_success(document, &message) {
                    log::error!("{}: could not record success: {}", document, e);
                }
                DocumentOutcome::Succeeded {
                    document: document.to_string(),
                    tables: truth.table_count(),
                    cells: truth.cell_count(),
                }
            }
            Err(e) => {
                log::warn!("{}: {}", document, e);
                let record = FailureRecord::new(document, &e);
                if let Err(log_err) = sink.record_failure(&record) {
                    log::error!("{}: could not record failure: {}", document, log_err);
                }
                DocumentOutcome::Failed {
                    document: document.to_string(),
                    category: record.category,
                    message: record.message,
                }
            }
        }
    }

    fn process(
        &self,
        document: &str,
        provider: &dyn DocumentProvider,
        sink: &dyn TruthSink,
    ) -> Result<DocumentTruth> {
        let workspace = Workspace::create(&self.scratch_root, document)?;
        let handles = provider.open(document, &workspace)?;
        self.pipeline
            .process(document, &handles, self.colors.colors(), sink)
    }
}
