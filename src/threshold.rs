//! Threshold selection for the vegetation mask.
//!
//! A pixel is vegetation when its normalized excess green `2g - r - b`
//! reaches the threshold. The threshold is either supplied by the caller
//! or chosen by Otsu's method on a 256-bin histogram of raw-channel
//! excess green.

use std::fmt;
use std::str::FromStr;

use rgb::RGB8;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pixels::PixelBuffer;

/// Number of histogram bins for the automatic method.
pub const HISTOGRAM_BINS: usize = 256;

/// How the vegetation threshold is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method", content = "value")]
pub enum ThresholdMethod {
    /// Otsu's method over the excess-green histogram.
    #[default]
    Auto,
    /// A caller-supplied threshold in `[-1, 1]`.
    Fixed(f64),
}

impl ThresholdMethod {
    /// Validating constructor for [`ThresholdMethod::Fixed`].
    pub fn fixed(value: f64) -> Result<Self> {
        let method = Self::Fixed(value);
        method.validate()?;
        Ok(method)
    }

    /// Reject non-finite or out-of-range fixed values.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Auto => Ok(()),
            Self::Fixed(v) if v.is_finite() && (-1.0..=1.0).contains(&v) => Ok(()),
            Self::Fixed(v) => Err(Error::invalid(format!(
                "fixed threshold {v} is outside [-1, 1]"
            ))),
        }
    }

    /// The code written to the `Threshold Method` CSV column.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auto => "otsu",
            Self::Fixed(_) => "exg",
        }
    }

    /// The text written to the `Threshold Value` CSV column.
    #[must_use]
    pub fn value_label(&self) -> String {
        match self {
            Self::Auto => "auto".to_string(),
            Self::Fixed(v) => format!("{v:.3}"),
        }
    }
}

impl fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("otsu"),
            Self::Fixed(v) => write!(f, "exg@{v:.3}"),
        }
    }
}

/// Accepts `auto`/`otsu` or a number.
impl FromStr for ThresholdMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "otsu" => Ok(Self::Auto),
            other => {
                let value: f64 = other
                    .parse()
                    .map_err(|_| Error::invalid(format!("invalid threshold: {s}")))?;
                Self::fixed(value)
            }
        }
    }
}

/// Compute the threshold for a buffer.
pub fn compute_threshold(buffer: &PixelBuffer, method: ThresholdMethod) -> Result<f64> {
    method.validate()?;
    match method {
        ThresholdMethod::Fixed(v) => Ok(v),
        ThresholdMethod::Auto => {
            let pixels = buffer.rgb_pixels()?;
            let tau = otsu_threshold(&excess_green_histogram(&pixels));
            tracing::debug!(threshold = tau, pixels = pixels.len(), "otsu threshold");
            Ok(tau)
        }
    }
}

/// Histogram bin for a pixel's raw excess green `2G - R - B`.
///
/// Maps `[-510, 510]` onto `[0, 255]`, rounding halves up.
#[inline]
#[must_use]
pub fn excess_green_bin(px: RGB8) -> usize {
    let exg = 2 * i32::from(px.g) - i32::from(px.r) - i32::from(px.b);
    ((exg + 510 + 2) / 4) as usize
}

/// Build the 256-bin raw excess-green histogram.
#[must_use]
pub fn excess_green_histogram(pixels: &[RGB8]) -> [u64; HISTOGRAM_BINS] {
    let mut hist = [0u64; HISTOGRAM_BINS];
    for &px in pixels {
        hist[excess_green_bin(px)] += 1;
    }
    hist
}

/// Map a histogram bin back to the normalized excess-green scale.
#[inline]
#[must_use]
pub fn bin_to_threshold(bin: usize) -> f64 {
    (4.0 * bin as f64 - 510.0) / 510.0
}

/// Otsu's method over an excess-green histogram.
///
/// Candidate splits `t` put bins `<= t` in the background. The first split
/// with the strictly largest between-class variance wins. When no split
/// separates two non-empty classes, a single populated bin yields that
/// bin's threshold and an empty histogram yields `0.0`.
#[must_use]
pub fn otsu_threshold(hist: &[u64; HISTOGRAM_BINS]) -> f64 {
    let total: f64 = hist.iter().map(|&h| h as f64).sum();
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = 0f64;
    let mut best_t: Option<usize> = None;

    for (t, &h) in hist.iter().enumerate().take(HISTOGRAM_BINS - 1) {
        w_b += h as f64;
        sum_b += t as f64 * h as f64;
        if w_b == 0.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }

        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;
        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = Some(t);
        }
    }

    match best_t {
        Some(t) => bin_to_threshold(t),
        None => hist
            .iter()
            .position(|&h| h > 0)
            .map_or(0.0, bin_to_threshold),
    }
}
