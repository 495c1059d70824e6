//! Marker color allocation.
//!
//! Colors are drawn uniformly from the full 24-bit RGB space and
//! rejection-sampled against every color this allocator has already issued,
//! so no two colors handed out by one allocator are ever equal.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::model::{Color, ColorTable};

/// Number of distinct 8-bit-per-channel RGB colors.
pub const COLOR_SPACE_SIZE: usize = 1 << 24;

/// Seeded allocator of globally unique colors.
///
/// The issued set is explicit state: it can be seeded from a previous run
/// with [`ColorAllocator::with_issued`] and handed back with
/// [`ColorAllocator::into_issued`].
#[derive(Debug, Clone)]
pub struct ColorAllocator {
    rng: StdRng,
    issued: HashSet<Color>,
}

impl ColorAllocator {
    /// Create an allocator with no issued colors.
    pub fn new(seed: u64) -> Self {
        Self::with_issued(seed, HashSet::new())
    }

    /// Create an allocator that will never reissue any color in `issued`.
    pub fn with_issued(seed: u64, issued: HashSet<Color>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued,
        }
    }

    /// Allocate `n` colors not yet issued, in draw order.
    ///
    /// Fails up front, without drawing anything, if fewer than `n` colors
    /// remain in the color space.
    pub fn allocate(&mut self, n: usize) -> Result<Vec<Color>> {
        let available = self.available();
        if n > available {
            return Err(Error::ExhaustedColorSpace {
                requested: n,
                available,
            });
        }

        let mut colors = Vec::with_capacity(n);
        while colors.len() < n {
            let color = Color::new(self.rng.gen(), self.rng.gen(), self.rng.gen());
            if self.issued.insert(color) {
                colors.push(color);
            }
        }
        log::debug!(
            "Allocated {} colors ({} issued in total)",
            n,
            self.issued.len()
        );
        Ok(colors)
    }

    /// Colors that can still be issued.
    pub fn available(&self) -> usize {
        COLOR_SPACE_SIZE.saturating_sub(self.issued.len())
    }

    /// Colors issued so far.
    pub fn issued(&self) -> &HashSet<Color> {
        &self.issued
    }

    pub fn into_issued(self) -> HashSet<Color> {
        self.issued
    }
}

/// Allocate `n` unique colors with a fresh allocator seeded with `seed`.
pub fn allocate(n: usize, seed: u64) -> Result<ColorTable> {
    ColorAllocator::new(seed).allocate(n).map(ColorTable::new)
}
