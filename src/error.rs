//! Error taxonomy for the extraction pipeline.
//!
//! Every variant is fatal for the recording being processed: a partial trial
//! table is not meaningful downstream.  Recoverable situations (a missing
//! forward marker, too few samples for IQR bounds) are represented as
//! `None` / unbounded values instead and never reach this type.
use std::fmt;

use thiserror::Error;

use crate::blocks::BlockId;

/// Which pulse a per-window error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseRef {
    /// Index into the in-game trials.
    Trial(usize),
    /// Index into the resting-period pulses.
    Rest(usize),
}

impl fmt::Display for PulseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PulseRef::Trial(i) => write!(f, "trial {i}"),
            PulseRef::Rest(i) => write!(f, "rest pulse {i}"),
        }
    }
}

/// Errors raised by the MEP pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MepError {
    // ── Configuration errors ─────────────────────────────────────────────
    /// A window around a trigger does not fit inside the recording.
    #[error(
        "{}window [{start}, {end}) around sample {trigger} \
         lies outside recording of {n_samples} samples",
        pulse_prefix(.pulse)
    )]
    WindowOutOfBounds {
        pulse: Option<PulseRef>,
        trigger: usize,
        start: i64,
        end: i64,
        n_samples: usize,
    },

    /// The peak-to-peak delay swallows the whole window.
    #[error("peak-to-peak delay of {delay} samples >= window length {len}")]
    DelayExceedsWindow { delay: usize, len: usize },

    /// No trial qualified for the normalisation divisor.
    #[error(
        "no valid amplitude below {ceiling} in reference blocks {reference:?}; \
         block tagging is inconsistent with the data"
    )]
    EmptyReferenceSubset { reference: Vec<BlockId>, ceiling: f64 },

    /// A normalisation divisor is zero or not finite.
    #[error("normalisation divisor {divisor} is not usable")]
    InvalidDivisor { divisor: f64 },

    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Data inconsistencies ─────────────────────────────────────────────
    /// Two per-trial arrays that must be parallel have different lengths.
    #[error("length mismatch: {what} has {left} entries, expected {right}")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// A trial lacks the symbol or outcome a labelling rule needs.
    #[error("trial {trial}: missing {field} required for labelling")]
    MissingField { trial: usize, field: &'static str },

    /// The number of channels in the recording is too small.
    #[error("recording has {found} channels, need at least {needed}")]
    MissingChannel { found: usize, needed: usize },
}

impl MepError {
    /// Attach the trial index to a window error raised by a per-window helper.
    pub fn at_trial(self, index: usize) -> Self {
        self.at_pulse(PulseRef::Trial(index))
    }

    /// Attach the resting-pulse index to a window error.
    pub fn at_rest_pulse(self, index: usize) -> Self {
        self.at_pulse(PulseRef::Rest(index))
    }

    fn at_pulse(self, pulse: PulseRef) -> Self {
        match self {
            MepError::WindowOutOfBounds { trigger, start, end, n_samples, .. } => {
                MepError::WindowOutOfBounds { pulse: Some(pulse), trigger, start, end, n_samples }
            }
            other => other,
        }
    }

    /// `true` for errors caused by parameters rather than by the data itself.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MepError::WindowOutOfBounds { .. }
                | MepError::DelayExceedsWindow { .. }
                | MepError::EmptyReferenceSubset { .. }
                | MepError::InvalidDivisor { .. }
                | MepError::InvalidConfig(_)
        )
    }
}

fn pulse_prefix(pulse: &Option<PulseRef>) -> String {
    pulse.map(|p| format!("{p}: ")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, MepError>;

/// Fail with [`MepError::LengthMismatch`] unless `left == right`.
pub(crate) fn ensure_len(what: &'static str, left: usize, right: usize) -> Result<()> {
    if left != right {
        return Err(MepError::LengthMismatch { what, left, right });
    }
    Ok(())
}
