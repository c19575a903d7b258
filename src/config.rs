//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter of the extraction
//! pipeline.  All fields have defaults matching the goalkeeper-game TMS
//! protocol (3 kHz recordings, 10 ms / 60 ms MEP window, 500 ms RMS window).
//! The struct is passed explicitly into every stage; nothing in the crate
//! reads process-wide flags.
use serde::{Deserialize, Serialize};

use crate::amplitude;
use crate::blocks::{BlockId, BlockSchedule, PULSE_BLOCKS};
use crate::error::{MepError, Result};
use crate::exclusion::ExclusionPolicy;
use crate::recording::Channel;

/// Which exclusion rule to apply to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionMethod {
    /// Exclude trials whose pre-stimulus RMS exceeds `mean + k·SD`.
    #[serde(rename = "RMS", alias = "rms")]
    Rms,
    /// Exclude IQR outliers among reference-block trials.
    #[serde(rename = "outliers")]
    Outliers,
}

/// Per-channel minimum peak-to-peak amplitude in µV.
///
/// In-game amplitudes below the floor are treated as missing.  `None`
/// disables the floor for that channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplitudeFloor {
    pub fdi: Option<f64>,
    pub fds: Option<f64>,
}

impl AmplitudeFloor {
    pub fn get(&self, ch: Channel) -> Option<f64> {
        match ch {
            Channel::Fdi => self.fdi,
            Channel::Fds => self.fds,
        }
    }
}

/// Configuration for the MEP extraction pipeline.
///
/// All fields are `pub`, so struct-update syntax works:
///
/// ```
/// use mep::{ExclusionMethod, PipelineConfig};
///
/// let cfg = PipelineConfig {
///     exclusion: ExclusionMethod::Outliers,
///     rms_k: 2.5,
///     ..PipelineConfig::default()
/// };
/// assert_eq!(cfg.samples_after(3000.0), 180);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Window length before the stimulus for the MEP window, in seconds.
    ///
    /// Default: `0.01` s.
    pub time_before_stim: f64,

    /// Window length after the stimulus for the MEP window, in seconds.
    ///
    /// Default: `0.06` s.
    pub time_after_stim: f64,

    /// Length of the pre-stimulus RMS noise window, in seconds.
    ///
    /// The window ends exactly at the trigger sample.
    ///
    /// Default: `0.5` s.
    pub time_before_rms: f64,

    /// Delay applied before the peak search, in milliseconds.
    ///
    /// Skips the stimulation artefact at the start of the MEP window.
    /// Converted to samples with `floor(delay_ms · sfreq / 1000)`.
    ///
    /// Default: `10.0` ms.
    pub p2p_delay_ms: f64,

    /// Exclusion rule for this run.
    ///
    /// Default: [`ExclusionMethod::Rms`].
    pub exclusion: ExclusionMethod,

    /// Multiplier `k` of the RMS threshold `mean + k·SD`.
    ///
    /// Default: `2.0`.
    pub rms_k: f64,

    /// Blocks used for IQR exclusion and for the normalisation divisor.
    ///
    /// Default: `[2, 4, 6]` (pulse blocks).
    pub reference_blocks: Vec<BlockId>,

    /// Amplitudes at or above this value (µV) never enter the normalisation
    /// divisor.  Catches values left in volts among microvolts.
    ///
    /// Default: `5000.0`.
    pub sanity_ceiling: f64,

    /// Factor converting recording units to microvolts.
    ///
    /// Default: `1e6` (recording in volts).
    pub unit_scale: f64,

    /// How trials are laid out into blocks.
    pub block_schedule: BlockSchedule,

    /// Stimulus samples to discard before matching (spurious pulse markers).
    ///
    /// Default: `[]`.
    pub spurious_triggers: Vec<usize>,

    /// Resting-period pulse samples given by hand, replacing the pulses
    /// found by the rest / in-game split.  For sessions whose rest markers
    /// were not recorded as consecutive stimulus markers.
    ///
    /// Default: `None`.
    pub rest_triggers: Option<Vec<usize>>,

    /// Response times above this value (seconds) are reported as missing.
    ///
    /// Default: `None` (keep every response time).
    pub max_response_time_s: Option<f64>,

    /// Per-channel amplitude floor in µV, applied before exclusion.
    ///
    /// Default: no floor.
    pub min_amplitude_uv: AmplitudeFloor,

    /// Whether familiarisation trials (block 0) take part in the
    /// `context` / `last_was_error` labelling.  When `false` they are left
    /// unlabelled and the labelling pass starts at the first block-1 trial.
    ///
    /// Default: `false`.
    pub label_familiarization: bool,

    /// Participant number written into the `ID_info` column.
    ///
    /// Default: `0`.
    pub participant: u32,
}

impl Default for PipelineConfig {
    /// 10 ms / 60 ms MEP window · 500 ms RMS window · 10 ms delay ·
    /// RMS exclusion with k = 2 · reference blocks 2, 4, 6.
    fn default() -> Self {
        Self {
            time_before_stim: 0.01,
            time_after_stim: 0.06,
            time_before_rms: 0.5,
            p2p_delay_ms: 10.0,
            exclusion: ExclusionMethod::Rms,
            rms_k: 2.0,
            reference_blocks: PULSE_BLOCKS.to_vec(),
            sanity_ceiling: 5000.0,
            unit_scale: 1e6,
            block_schedule: BlockSchedule::default(),
            spurious_triggers: vec![],
            rest_triggers: None,
            max_response_time_s: None,
            min_amplitude_uv: AmplitudeFloor::default(),
            label_familiarization: false,
            participant: 0,
        }
    }
}

impl PipelineConfig {
    /// Samples before the trigger in the MEP window: `floor(time_before_stim · sfreq)`.
    pub fn samples_before(&self, sfreq: f64) -> usize {
        (self.time_before_stim * sfreq) as usize
    }

    /// Samples after the trigger in the MEP window: `floor(time_after_stim · sfreq)`.
    ///
    /// ```
    /// let cfg = mep::PipelineConfig::default();
    /// assert_eq!(cfg.samples_before(3000.0) + cfg.samples_after(3000.0), 210);
    /// ```
    pub fn samples_after(&self, sfreq: f64) -> usize {
        (self.time_after_stim * sfreq) as usize
    }

    /// Length of the RMS window in samples: `floor(time_before_rms · sfreq)`.
    pub fn samples_before_rms(&self, sfreq: f64) -> usize {
        (self.time_before_rms * sfreq) as usize
    }

    /// Peak-search delay in samples.
    pub fn delay_samples(&self, sfreq: f64) -> usize {
        amplitude::delay_samples(self.p2p_delay_ms, sfreq)
    }

    /// The exclusion policy selected by [`exclusion`](Self::exclusion).
    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        match self.exclusion {
            ExclusionMethod::Rms => ExclusionPolicy::Rms { k: self.rms_k },
            ExclusionMethod::Outliers => ExclusionPolicy::Iqr {
                reference_blocks: self.reference_blocks.clone(),
            },
        }
    }

    /// Reject parameter combinations no recording could satisfy.
    pub fn validate(&self, sfreq: f64) -> Result<()> {
        if !(sfreq.is_finite() && sfreq > 0.0) {
            return Err(MepError::InvalidConfig(format!("sampling rate {sfreq} Hz")));
        }
        for (name, v) in [
            ("time_before_stim", self.time_before_stim),
            ("time_after_stim", self.time_after_stim),
            ("time_before_rms", self.time_before_rms),
            ("p2p_delay_ms", self.p2p_delay_ms),
            ("rms_k", self.rms_k),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(MepError::InvalidConfig(format!("{name} = {v}")));
            }
        }
        for (name, v) in [
            ("max_response_time_s", self.max_response_time_s),
            ("min_amplitude_uv.fdi", self.min_amplitude_uv.fdi),
            ("min_amplitude_uv.fds", self.min_amplitude_uv.fds),
        ] {
            if let Some(v) = v {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(MepError::InvalidConfig(format!("{name} = {v}")));
                }
            }
        }
        if self.samples_before_rms(sfreq) == 0 {
            return Err(MepError::InvalidConfig("RMS window has no samples".into()));
        }
        let len = self.samples_before(sfreq) + self.samples_after(sfreq);
        let delay = self.delay_samples(sfreq);
        if delay >= len {
            return Err(MepError::DelayExceedsWindow { delay, len });
        }
        Ok(())
    }
}
