//! Orchestration: the render-triple protocol per document, batching across
//! documents, and persistence.
//!
//! # Example
//!
//! ```no_run
//! use gridtruth::pipeline::{BatchRunner, FsSink, PipelineOptions, PrerenderedProvider, RenderDirs};
//!
//! fn main() -> gridtruth::Result<()> {
//!     let dirs = RenderDirs {
//!         marked: "renders/fuchsia".into(),
//!         second: "renders/aqua".into(),
//!         cells: "renders/cells".into(),
//!     };
//!     let provider = PrerenderedProvider::new(dirs, 40);
//!     let sink = FsSink::create("out")?;
//!     let runner = BatchRunner::new(PipelineOptions::default(), std::env::temp_dir())?;
//!
//!     let report = runner.run(&["report-17".to_string()], &provider, &sink, |_| {});
//!     println!("{} succeeded", report.succeeded());
//!     Ok(())
//! }
//! ```

mod batch;
mod collaborators;
mod coordinator;
mod options;
mod prerendered;
mod sink;
mod timeout;
mod workspace;

pub use batch::{BatchReport, BatchRunner, DocumentOutcome};
pub use collaborators::{DocumentHandles, DocumentProvider, MarkupInjector, PageImages, Renderer};
pub use coordinator::DocumentPipeline;
pub use options::{PipelineOptions, DEFAULT_COLOR_POOL, DEFAULT_STAGE_TIMEOUT};
pub use prerendered::{load_pages, PrerenderedDocument, PrerenderedProvider, RenderDirs};
pub use sink::{FailureRecord, FsSink, MemorySink, TruthSink, PROCESSED_LOG};
pub use timeout::run_with_timeout;
pub use workspace::Workspace;
