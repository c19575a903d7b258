/// Shared builders for synthetic TMS sessions.
use mep::{BlockSchedule, Marker, MarkerCode, PipelineConfig, Recording, Symbol};
use ndarray::Array2;
use std::f64::consts::PI;

pub const SFREQ: f64 = 1000.0;
/// Peak amplitude (V) of the synthetic MEP burst on FDI; FDS gets half.
pub const BURST: f64 = 1e-3;
/// Amplitude (V) of the pre-stimulus noise on noisy trials.
pub const NOISE: f64 = 1e-4;
/// Peak amplitude (V) of the resting-period MEPs on FDI.
pub const REST_BURST: f64 = 5e-4;

pub const FIRST_TRIAL: usize = 3000;
pub const TRIAL_SPACING: usize = 1500;
pub const REST_PULSES: [usize; 3] = [1000, 1600, 2200];

#[allow(unused)]
pub struct Session {
    pub rec: Recording,
    /// In-game pulse samples.
    pub triggers: Vec<usize>,
}

fn burst(row: &mut [f64], t: usize, amp: f64) {
    // One 20 ms sine period starting 15 ms after the pulse; peak at +20, trough at +30.
    for k in 0..20 {
        row[t + 15 + k] = amp * (2.0 * PI * k as f64 / 20.0).sin();
    }
}

fn noise(row: &mut [f64], from: usize, to: usize, amp: f64) {
    for (i, v) in row.iter_mut().enumerate().take(to).skip(from) {
        *v = amp * ((i as f64) * 0.7).sin();
    }
}

fn choice_code(s: u8) -> MarkerCode {
    MarkerCode::Choice(Symbol::from_value(s).unwrap())
}

/// A session with three resting pulses followed by one game trial per entry
/// of `sequence`.
///
/// Trial `i` has its pulse at `FIRST_TRIAL + i · TRIAL_SPACING`, preceded by
/// a trial-start marker and followed by the arrow onset (+200), the
/// goalkeeper symbol (+300) and the participant's choice (+600).
/// Clean trials carry a burst of known amplitude on a flat baseline; noisy
/// trials carry only noise from 500 ms before the pulse to the window end.
#[allow(unused)]
pub fn session(sequence: &[u8], choices: &[u8], clean: &[bool]) -> Session {
    assert_eq!(sequence.len(), choices.len());
    assert_eq!(sequence.len(), clean.len());
    let n = sequence.len();
    let n_samples = FIRST_TRIAL + n * TRIAL_SPACING + 1000;

    let mut fdi = vec![0.0; n_samples];
    let mut fds = vec![0.0; n_samples];
    let mut markers = Vec::new();

    for &r in &REST_PULSES {
        burst(&mut fdi, r, REST_BURST);
        burst(&mut fds, r, REST_BURST / 2.0);
        markers.push(Marker::new(r, MarkerCode::Stimulus));
    }

    let mut triggers = Vec::with_capacity(n);
    for i in 0..n {
        let t = FIRST_TRIAL + i * TRIAL_SPACING;
        triggers.push(t);
        if clean[i] {
            burst(&mut fdi, t, BURST);
            burst(&mut fds, t, BURST / 2.0);
        } else {
            noise(&mut fdi, t - 500, t + 60, NOISE);
            noise(&mut fds, t - 500, t + 60, NOISE);
        }
        markers.push(Marker::new(t - 100, MarkerCode::TrialStart));
        markers.push(Marker::new(t, MarkerCode::Stimulus));
        markers.push(Marker::new(t + 200, MarkerCode::ArrowOnset));
        markers.push(Marker::new(t + 300, choice_code(sequence[i])));
        markers.push(Marker::new(t + 600, choice_code(choices[i])));
    }

    let mut data = Array2::zeros((2, n_samples));
    data.row_mut(0).assign(&ndarray::ArrayView1::from(&fdi));
    data.row_mut(1).assign(&ndarray::ArrayView1::from(&fds));

    Session {
        rec: Recording::new(data, SFREQ, markers).unwrap(),
        triggers,
    }
}

/// Default protocol timing with a schedule of `blocks` blocks of
/// `per_block` trials and no familiarisation block.
#[allow(unused)]
pub fn config(per_block: usize, blocks: usize) -> PipelineConfig {
    PipelineConfig {
        block_schedule: BlockSchedule {
            familiarization_trials: 0,
            trials_per_block: per_block,
            blocks,
        },
        participant: 15,
        ..PipelineConfig::default()
    }
}

#[allow(unused)]
pub fn symbols(v: &[u8]) -> Vec<Option<Symbol>> {
    v.iter().map(|&s| Symbol::from_value(s)).collect()
}
