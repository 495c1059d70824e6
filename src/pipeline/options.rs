//! Pipeline configuration.

use std::time::Duration;

use crate::recover::{CellOptions, LineOptions, LocatorOptions};

/// Default number of colors allocated for a batch.
pub const DEFAULT_COLOR_POOL: usize = 100_000;

/// Default bound on a single external call.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Options for running the pipeline over documents.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Table localization
    pub locator: LocatorOptions,

    /// Cell recovery
    pub cells: CellOptions,

    /// Line synthesis and the grid gate
    pub lines: LineOptions,

    /// Seed for cell color allocation
    pub color_seed: u64,

    /// Number of cell colors allocated for a batch
    pub color_pool: usize,

    /// Bound on each injector or renderer call (None = unbounded)
    pub stage_timeout: Option<Duration>,

    /// Process documents concurrently
    pub parallel: bool,

    /// Persist cell and line overlays for accepted tables
    pub debug_overlays: bool,

    /// Skip documents the sink already has a record for
    pub skip_completed: bool,
}

impl PipelineOptions {
    /// Create new pipeline options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locator(mut self, options: LocatorOptions) -> Self {
        self.locator = options;
        self
    }

    pub fn with_cells(mut self, options: CellOptions) -> Self {
        self.cells = options;
        self
    }

    pub fn with_lines(mut self, options: LineOptions) -> Self {
        self.lines = options;
        self
    }

    /// Set the color allocation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.color_seed = seed;
        self
    }

    /// Set how many colors are allocated.
    pub fn with_color_pool(mut self, pool: usize) -> Self {
        self.color_pool = pool;
        self
    }

    /// Set the external call bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    /// Let external calls run unbounded.
    pub fn without_timeout(mut self) -> Self {
        self.stage_timeout = None;
        self
    }

    /// Process documents one at a time.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_debug_overlays(mut self, enabled: bool) -> Self {
        self.debug_overlays = enabled;
        self
    }

    pub fn with_skip_completed(mut self, skip: bool) -> Self {
        self.skip_completed = skip;
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            locator: LocatorOptions::default(),
            cells: CellOptions::default(),
            lines: LineOptions::default(),
            color_seed: 0,
            color_pool: DEFAULT_COLOR_POOL,
            stage_timeout: Some(DEFAULT_STAGE_TIMEOUT),
            parallel: true,
            debug_overlays: false,
            skip_completed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        let opts = PipelineOptions::default();
        assert_eq!(opts.color_seed, 0);
        assert_eq!(opts.color_pool, 100_000);
        assert_eq!(opts.stage_timeout, Some(Duration::from_secs(300)));
        assert!(opts.parallel);
        assert!(!opts.debug_overlays);
    }

    #[test]
    fn test_pipeline_builder() {
        let opts = PipelineOptions::new()
            .with_seed(9)
            .with_color_pool(64)
            .without_timeout()
            .sequential()
            .with_debug_overlays(true);
        assert_eq!(opts.color_seed, 9);
        assert_eq!(opts.color_pool, 64);
        assert!(opts.stage_timeout.is_none());
        assert!(!opts.parallel);
        assert!(opts.debug_overlays);
    }
}
