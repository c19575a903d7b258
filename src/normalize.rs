//! MEP normalisation.
//!
//! `normalize_by_mean`: relative to the mean amplitude of the reference
//!   blocks:  divisor = mean{ a[i] : block[i] ∈ ref, a[i] valid, a[i] < ceiling }
//!   out[i] = a[i] / divisor  for every trial.
//!
//! `normalize_by_rest`: relative to the mean amplitude of the pulses
//!   delivered during the resting period:  out[i] = a[i] / rest.
//!
//! Missing (excluded) amplitudes stay missing and never enter a divisor.
use tracing::debug;

use crate::blocks::BlockId;
use crate::error::{ensure_len, MepError, Result};

fn check_divisor(divisor: f64) -> Result<f64> {
    if !divisor.is_finite() || divisor == 0.0 {
        return Err(MepError::InvalidDivisor { divisor });
    }
    Ok(divisor)
}

fn divide(amplitudes: &[Option<f64>], divisor: f64) -> Vec<Option<f64>> {
    amplitudes.iter().map(|a| a.map(|v| v / divisor)).collect()
}

/// Mean of the valid reference-block amplitudes below `ceiling`.
pub fn reference_mean(
    amplitudes: &[Option<f64>],
    blocks: &[BlockId],
    reference: &[BlockId],
    ceiling: f64,
) -> Result<f64> {
    ensure_len("block tags", blocks.len(), amplitudes.len())?;
    let (sum, n) = amplitudes
        .iter()
        .zip(blocks)
        .filter_map(|(a, b)| match a {
            Some(v) if reference.contains(b) && *v < ceiling => Some(*v),
            _ => None,
        })
        .fold((0.0_f64, 0_usize), |(s, n), v| (s + v, n + 1));

    if n == 0 {
        return Err(MepError::EmptyReferenceSubset {
            reference: reference.to_vec(),
            ceiling,
        });
    }
    Ok(sum / n as f64)
}

/// Divide every amplitude by the mean of the reference subset.
///
/// The divisor uses only trials in `reference` blocks that are present and
/// below `ceiling`; the division is then applied to all trials.
pub fn normalize_by_mean(
    amplitudes: &[Option<f64>],
    blocks: &[BlockId],
    reference: &[BlockId],
    ceiling: f64,
) -> Result<Vec<Option<f64>>> {
    let divisor = check_divisor(reference_mean(amplitudes, blocks, reference, ceiling)?)?;
    debug!(divisor, "normalising by reference-block mean");
    Ok(divide(amplitudes, divisor))
}

/// Mean peak-to-peak amplitude of the resting-period pulses, scaled by `scale`.
pub fn rest_amplitude(peak_to_peak: &[f64], scale: f64) -> Result<f64> {
    if peak_to_peak.is_empty() {
        return Err(MepError::InvalidDivisor { divisor: f64::NAN });
    }
    Ok(peak_to_peak.iter().sum::<f64>() / peak_to_peak.len() as f64 * scale)
}

/// Divide every amplitude by a fixed resting amplitude.
pub fn normalize_by_rest(amplitudes: &[Option<f64>], rest: f64) -> Result<Vec<Option<f64>>> {
    let divisor = check_divisor(rest)?;
    Ok(divide(amplitudes, divisor))
}

/// Multiply present values by `scale` (e.g. volts → µV).
pub fn scale(amplitudes: &[Option<f64>], scale: f64) -> Vec<Option<f64>> {
    amplitudes.iter().map(|a| a.map(|v| v * scale)).collect()
}
