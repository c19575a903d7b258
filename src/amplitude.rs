//! Peak-to-peak and RMS amplitudes of stimulus-locked windows.
//!
//! Both measures are pure functions of one window, so the per-trial loop in
//! [`measure_triggers`] has no cross-trial state and its result does not
//! depend on evaluation order.
use ndarray::ArrayView1;
use tracing::debug;

use crate::error::{MepError, Result};
use crate::recording::{Channel, Recording};
use crate::window::WindowSpec;

/// Convert a delay in milliseconds to whole samples (floored).
pub fn delay_samples(delay_ms: f64, sfreq: f64) -> usize {
    (delay_ms * (sfreq / 1000.0)).floor() as usize
}

/// `max(window[delay..]) - min(window[delay..])`.
///
/// The delay skips the stimulation artefact at the start of the window,
/// which can be orders of magnitude larger than the MEP itself.
pub fn peak_to_peak(window: ArrayView1<'_, f64>, delay: usize) -> Result<f64> {
    if delay >= window.len() {
        return Err(MepError::DelayExceedsWindow {
            delay,
            len: window.len(),
        });
    }
    let (lo, hi) = window
        .iter()
        .skip(delay)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    Ok(hi - lo)
}

/// Root mean square of the window: `sqrt(mean(x²))`.  Zero for an empty window.
pub fn rms(window: ArrayView1<'_, f64>) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let ss: f64 = window.iter().map(|&v| v * v).sum();
    (ss / window.len() as f64).sqrt()
}

/// Amplitudes of one trial on one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeSample {
    /// Peak-to-peak amplitude of the MEP window.
    pub peak_to_peak: f64,
    /// RMS of the pre-stimulus window.
    pub rms_precursor: f64,
    /// Cleared by the exclusion engine; never set back.
    pub valid: bool,
}

impl AmplitudeSample {
    pub fn new(peak_to_peak: f64, rms_precursor: f64) -> Self {
        Self {
            peak_to_peak,
            rms_precursor,
            valid: true,
        }
    }

    /// Peak-to-peak amplitude, or `None` once excluded.
    pub fn value(&self) -> Option<f64> {
        self.valid.then_some(self.peak_to_peak)
    }

    /// Copy with `valid` cleared.
    pub fn invalidated(self) -> Self {
        Self { valid: false, ..self }
    }
}

/// Peak-to-peak values of valid samples, `None` for excluded ones.
pub fn values(samples: &[AmplitudeSample]) -> Vec<Option<f64>> {
    samples.iter().map(AmplitudeSample::value).collect()
}

/// Per-channel amplitude samples, one entry per trigger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelAmplitudes {
    pub fdi: Vec<AmplitudeSample>,
    pub fds: Vec<AmplitudeSample>,
}

impl ChannelAmplitudes {
    pub fn get(&self, ch: Channel) -> &[AmplitudeSample] {
        match ch {
            Channel::Fdi => &self.fdi,
            Channel::Fds => &self.fds,
        }
    }

    pub fn len(&self) -> usize {
        self.fdi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fdi.is_empty()
    }

    /// Apply `f` to each channel, returning new samples.
    pub fn try_map<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(Channel, &[AmplitudeSample]) -> Result<Vec<AmplitudeSample>>,
    {
        Ok(Self {
            fdi: f(Channel::Fdi, &self.fdi)?,
            fds: f(Channel::Fds, &self.fds)?,
        })
    }
}

/// Measure one channel at every trigger.
pub fn measure_channel(
    samples: ArrayView1<'_, f64>,
    triggers: &[usize],
    spec: &WindowSpec,
    delay: usize,
) -> Result<Vec<AmplitudeSample>> {
    if delay >= spec.mep_len() {
        return Err(MepError::DelayExceedsWindow {
            delay,
            len: spec.mep_len(),
        });
    }
    triggers
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let (mep, pre) = spec.windows(samples, i, t)?;
            Ok(AmplitudeSample::new(peak_to_peak(mep, delay)?, rms(pre)))
        })
        .collect()
}

/// Measure both channels of `rec` at every trigger.
pub fn measure_triggers(
    rec: &Recording,
    triggers: &[usize],
    spec: &WindowSpec,
    delay: usize,
) -> Result<ChannelAmplitudes> {
    let fdi = measure_channel(rec.channel(Channel::Fdi), triggers, spec, delay)?;
    let fds = measure_channel(rec.channel(Channel::Fds), triggers, spec, delay)?;
    debug!(n_triggers = triggers.len(), ?spec, delay, "measured amplitudes");
    Ok(ChannelAmplitudes { fdi, fds })
}

/// Peak-to-peak amplitudes of the resting-period pulses, per channel.
///
/// Rest pulses only feed the rest divisor, so no pre-stimulus window is cut
/// and nothing is excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestAmplitudes {
    pub fdi: Vec<f64>,
    pub fds: Vec<f64>,
}

impl RestAmplitudes {
    pub fn get(&self, ch: Channel) -> &[f64] {
        match ch {
            Channel::Fdi => &self.fdi,
            Channel::Fds => &self.fds,
        }
    }

    pub fn len(&self) -> usize {
        self.fdi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fdi.is_empty()
    }
}

/// Peak-to-peak of the MEP window at every rest pulse of one channel.
///
/// Window errors carry the rest-pulse index.
pub fn measure_rest_channel(
    samples: ArrayView1<'_, f64>,
    pulses: &[usize],
    spec: &WindowSpec,
    delay: usize,
) -> Result<Vec<f64>> {
    pulses
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let mep = spec.mep_window(samples, t).map_err(|e| e.at_rest_pulse(i))?;
            peak_to_peak(mep, delay)
        })
        .collect()
}

/// Measure both channels of `rec` at every rest pulse.
pub fn measure_rest_pulses(
    rec: &Recording,
    pulses: &[usize],
    spec: &WindowSpec,
    delay: usize,
) -> Result<RestAmplitudes> {
    let fdi = measure_rest_channel(rec.channel(Channel::Fdi), pulses, spec, delay)?;
    let fds = measure_rest_channel(rec.channel(Channel::Fds), pulses, spec, delay)?;
    debug!(n_pulses = pulses.len(), "measured rest amplitudes");
    Ok(RestAmplitudes { fdi, fds })
}
