//! Structural similarity between two grayscale renders.
//!
//! Mean SSIM over a 7x7 uniform window with sample covariance, the
//! conventional constants for 8-bit data, and reflected borders. The full
//! per-pixel map is kept so the localizer can threshold it.

use image::{GrayImage, Luma};

use crate::error::{Error, Result};

/// Side of the square sliding window.
pub const WINDOW: usize = 7;

const DATA_RANGE: f64 = 255.0;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Per-pixel similarity between two images plus its mean.
#[derive(Debug, Clone)]
pub struct SimilarityMap {
    /// Mean similarity, excluding a half-window border
    pub score: f64,
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl SimilarityMap {
    /// Map for two byte-identical images: similarity 1 everywhere.
    fn identical(width: u32, height: u32) -> Self {
        Self {
            score: 1.0,
            width,
            height,
            values: vec![1.0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Similarity at a pixel.
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Whether the two images were judged identical.
    pub fn is_identical(&self) -> bool {
        self.score >= 1.0
    }

    /// Scale the map to 8 bits: dissimilar regions come out dark.
    ///
    /// Negative similarity is clamped to zero.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let v = self.get(x, y).clamp(0.0, 1.0) * 255.0;
            Luma([v as u8])
        })
    }
}

/// Compute the structural similarity map of two equally sized images.
///
/// Byte-identical inputs short-circuit to a score of exactly 1.
pub fn structural_similarity(a: &GrayImage, b: &GrayImage) -> Result<SimilarityMap> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::RenderMismatch(format!(
            "render sizes differ: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    let (width, height) = a.dimensions();
    if (width as usize) < WINDOW || (height as usize) < WINDOW {
        return Err(Error::RenderMismatch(format!(
            "render {}x{} is smaller than the {}px similarity window",
            width, height, WINDOW
        )));
    }
    if a.as_raw() == b.as_raw() {
        return Ok(SimilarityMap::identical(width, height));
    }

    let (w, h) = (width as usize, height as usize);
    let x: Vec<f64> = a.as_raw().iter().map(|&p| p as f64).collect();
    let y: Vec<f64> = b.as_raw().iter().map(|&p| p as f64).collect();
    let xx: Vec<f64> = x.iter().map(|v| v * v).collect();
    let yy: Vec<f64> = y.iter().map(|v| v * v).collect();
    let xy: Vec<f64> = x.iter().zip(&y).map(|(p, q)| p * q).collect();

    let ux = uniform_filter(&x, w, h);
    let uy = uniform_filter(&y, w, h);
    let uxx = uniform_filter(&xx, w, h);
    let uyy = uniform_filter(&yy, w, h);
    let uxy = uniform_filter(&xy, w, h);

    let np = (WINDOW * WINDOW) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let values: Vec<f64> = (0..w * h)
        .map(|i| {
            let vx = cov_norm * (uxx[i] - ux[i] * ux[i]);
            let vy = cov_norm * (uyy[i] - uy[i] * uy[i]);
            let vxy = cov_norm * (uxy[i] - ux[i] * uy[i]);
            let a1 = 2.0 * ux[i] * uy[i] + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux[i] * ux[i] + uy[i] * uy[i] + c1;
            let b2 = vx + vy + c2;
            (a1 * a2) / (b1 * b2)
        })
        .collect();

    let pad = (WINDOW - 1) / 2;
    let mut sum = 0.0;
    let mut count = 0usize;
    for row in pad..h - pad {
        for col in pad..w - pad {
            sum += values[row * w + col];
            count += 1;
        }
    }
    let score = if count > 0 { sum / count as f64 } else { 1.0 };

    Ok(SimilarityMap {
        score,
        width,
        height,
        values,
    })
}

/// Mirror an out-of-range index back into `0..n` (edge sample repeated).
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let mut i = i;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// Separable box mean over a `WINDOW` x `WINDOW` neighborhood.
fn uniform_filter(data: &[f64], w: usize, h: usize) -> Vec<f64> {
    let half = (WINDOW / 2) as isize;
    let scale = 1.0 / WINDOW as f64;

    let mut rows = vec![0.0; w * h];
    for r in 0..h {
        let line = &data[r * w..(r + 1) * w];
        for c in 0..w {
            let c = c as isize;
            let s: f64 = (c - half..=c + half).map(|k| line[reflect(k, w)]).sum();
            rows[r * w + c as usize] = s * scale;
        }
    }

    let mut out = vec![0.0; w * h];
    for c in 0..w {
        for r in 0..h {
            let r = r as isize;
            let s: f64 = (r - half..=r + half)
                .map(|k| rows[reflect(k, h) * w + c])
                .sum();
            out[r as usize * w + c] = s * scale;
        }
    }
    out
}
