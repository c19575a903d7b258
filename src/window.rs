//! Stimulus-locked windows.
//!
//! Two windows are cut around every trigger sample `t`:
//!
//! ```text
//!            ┌──── RMS window ────┐
//!   ─────────┼────────────────────┼──────────────────────────►
//!            t - before_rms       t
//!                          ┌──── MEP window ─────┐
//!                          t - before        t + after
//! ```
//!
//! Windows that do not fit in the recording are an error, never clipped:
//! a truncated window near the recording edge would bias the amplitude.
use ndarray::{s, ArrayView1};

use crate::error::{MepError, Result};

fn bounds_error(trigger: usize, start: i64, end: i64, n_samples: usize) -> MepError {
    MepError::WindowOutOfBounds {
        pulse: None,
        trigger,
        start,
        end,
        n_samples,
    }
}

/// The `before + after` samples around `trigger`: `samples[trigger - before .. trigger + after]`.
pub fn extract_window<'a>(
    samples: ArrayView1<'a, f64>,
    trigger: usize,
    before: usize,
    after: usize,
) -> Result<ArrayView1<'a, f64>> {
    let n = samples.len();
    let start = trigger as i64 - before as i64;
    let end = trigger as i64 + after as i64;
    if start < 0 || end > n as i64 {
        return Err(bounds_error(trigger, start, end, n));
    }
    Ok(samples.slice_move(s![start as usize..end as usize]))
}

/// The `before_rms` samples ending exactly at `trigger` (exclusive).
pub fn extract_rms_window<'a>(
    samples: ArrayView1<'a, f64>,
    trigger: usize,
    before_rms: usize,
) -> Result<ArrayView1<'a, f64>> {
    extract_window(samples, trigger, before_rms, 0)
}

/// Window lengths in samples for one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub before: usize,
    pub after: usize,
    pub before_rms: usize,
}

impl WindowSpec {
    pub fn mep_len(&self) -> usize {
        self.before + self.after
    }

    /// MEP window alone, for pulses whose pre-stimulus noise is not assessed.
    pub fn mep_window<'a>(&self, samples: ArrayView1<'a, f64>, trigger: usize) -> Result<ArrayView1<'a, f64>> {
        extract_window(samples, trigger, self.before, self.after)
    }

    /// MEP and RMS windows of trial `trial` at `trigger`.
    ///
    /// Errors carry the trial index.
    pub fn windows<'a>(
        &self,
        samples: ArrayView1<'a, f64>,
        trial: usize,
        trigger: usize,
    ) -> Result<(ArrayView1<'a, f64>, ArrayView1<'a, f64>)> {
        let mep = self.mep_window(samples, trigger).map_err(|e| e.at_trial(trial))?;
        let rms = extract_rms_window(samples, trigger, self.before_rms)
            .map_err(|e| e.at_trial(trial))?;
        Ok((mep, rms))
    }
}
