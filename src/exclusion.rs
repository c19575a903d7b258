//! Artifact exclusion.
//!
//! Two policies, one per run:
//!
//! * **RMS threshold**: a trial is excluded when the RMS of its pre-stimulus
//!   window exceeds `mean + k·SD` of all pre-stimulus RMS values of that
//!   channel (background muscle contraction or noise before the pulse).
//! * **IQR**: among trials of the reference blocks only, a trial is excluded
//!   when its peak-to-peak amplitude lies outside
//!   `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`.  Other blocks are never touched.
//!
//! Exclusion only clears [`AmplitudeSample::valid`]; it never sets it back and
//! never modifies the caller's samples.  For a fixed threshold or fixed
//! bounds, applying the rule again reproduces the same marks.
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::amplitude::AmplitudeSample;
use crate::blocks::BlockId;
use crate::error::{ensure_len, Result};

/// Minimum number of reference samples for meaningful quartiles.
pub const MIN_IQR_SAMPLES: usize = 4;

/// The exclusion rule applied to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExclusionPolicy {
    /// Threshold `mean + k·SD` on pre-stimulus RMS.
    Rms { k: f64 },
    /// Tukey fences on amplitudes of the reference blocks.
    Iqr { reference_blocks: Vec<BlockId> },
}

impl ExclusionPolicy {
    /// Apply the policy to one channel.
    ///
    /// `blocks` must be parallel to `samples`; it is only consulted by the
    /// IQR policy but checked in both cases.
    pub fn apply(&self, samples: &[AmplitudeSample], blocks: &[BlockId]) -> Result<Vec<AmplitudeSample>> {
        ensure_len("block tags", blocks.len(), samples.len())?;
        let out = match self {
            ExclusionPolicy::Rms { k } => match rms_threshold(samples, *k) {
                Some(threshold) => {
                    debug!(threshold, k, "RMS exclusion threshold");
                    exclude_by_rms(samples, threshold)
                }
                None => samples.to_vec(),
            },
            ExclusionPolicy::Iqr { reference_blocks } => {
                exclude_iqr(samples, blocks, reference_blocks)?
            }
        };
        let newly = out
            .iter()
            .zip(samples)
            .filter(|(o, s)| s.valid && !o.valid)
            .count();
        debug!(policy = ?self, excluded = newly, n = samples.len(), "exclusion applied");
        Ok(out)
    }
}

// ── RMS threshold ────────────────────────────────────────────────────────

/// `mean + k·SD` (population SD) of the pre-stimulus RMS of every sample.
///
/// `None` for an empty channel.
pub fn rms_threshold(samples: &[AmplitudeSample], k: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|s| s.rms_precursor).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|s| {
            let d = s.rms_precursor - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    Some(mean + k * var.sqrt())
}

/// Invalidate every sample whose pre-stimulus RMS is above `threshold`.
pub fn exclude_by_rms(samples: &[AmplitudeSample], threshold: f64) -> Vec<AmplitudeSample> {
    samples
        .iter()
        .map(|&s| if s.rms_precursor > threshold { s.invalidated() } else { s })
        .collect()
}

/// Invalidate every sample whose peak-to-peak, in µV after `scale`, is
/// below `min_uv`.
///
/// Used for sessions where the coil position produced no reliable MEP on
/// part of the trials; the floor is set per participant and channel.
pub fn exclude_below(samples: &[AmplitudeSample], min_uv: f64, scale: f64) -> Vec<AmplitudeSample> {
    samples
        .iter()
        .map(|&s| if s.peak_to_peak * scale < min_uv { s.invalidated() } else { s })
        .collect()
}

// ── IQR ──────────────────────────────────────────────────────────────────

/// Closed interval outside of which an amplitude is an outlier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrBounds {
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Bounds that exclude nothing.
    pub fn unbounded() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

/// Percentile `q` (0–100) of sorted data with linear interpolation between
/// closest ranks.
///
/// `sorted` must be non-empty and ascending.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = q / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Tukey fences `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]` of `values`.
///
/// With fewer than [`MIN_IQR_SAMPLES`] values the quartiles are meaningless
/// and the bounds are unbounded; this is logged, not raised.
pub fn iqr_bounds(values: &[f64]) -> IqrBounds {
    if values.len() < MIN_IQR_SAMPLES {
        warn!(
            n = values.len(),
            min = MIN_IQR_SAMPLES,
            "too few reference samples for IQR bounds; no trial excluded"
        );
        return IqrBounds::unbounded();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    IqrBounds {
        lower: q1 - 1.5 * iqr,
        upper: q3 + 1.5 * iqr,
    }
}

/// Invalidate reference-block samples outside `bounds`.
pub fn exclude_outside(
    samples: &[AmplitudeSample],
    blocks: &[BlockId],
    reference: &[BlockId],
    bounds: IqrBounds,
) -> Result<Vec<AmplitudeSample>> {
    ensure_len("block tags", blocks.len(), samples.len())?;
    Ok(samples
        .iter()
        .zip(blocks)
        .map(|(&s, b)| {
            if reference.contains(b) && !bounds.contains(s.peak_to_peak) {
                s.invalidated()
            } else {
                s
            }
        })
        .collect())
}

/// IQR exclusion restricted to `reference` blocks.
///
/// Quartiles are computed from the still-valid reference samples only.
pub fn exclude_iqr(
    samples: &[AmplitudeSample],
    blocks: &[BlockId],
    reference: &[BlockId],
) -> Result<Vec<AmplitudeSample>> {
    ensure_len("block tags", blocks.len(), samples.len())?;
    let values: Vec<f64> = samples
        .iter()
        .zip(blocks)
        .filter(|(s, b)| s.valid && reference.contains(b))
        .map(|(s, _)| s.peak_to_peak)
        .collect();
    let bounds = iqr_bounds(&values);
    debug!(?bounds, n_reference = values.len(), "IQR bounds");
    exclude_outside(samples, blocks, reference, bounds)
}
