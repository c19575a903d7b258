//! # mep: motor-evoked potential extraction for TMS recordings
//!
//! `mep` turns one continuous EMG recording of the goalkeeper-game TMS task
//! into a per-trial table of MEP amplitudes and behavioural variables, ready
//! for group statistics.
//!
//! ## Pipeline overview
//!
//! ```text
//! Recording  ([C, T] samples, sfreq, markers)
//!   │
//!   ├─ events::EventStream          sort, start at first pulse, split rest / game
//!   ├─ response::match_responses()  onset → sequence symbol, choice, response time
//!   ├─ window::WindowSpec           MEP window [t − 10 ms, t + 60 ms), RMS window [t − 500 ms, t)
//!   ├─ amplitude                    peak-to-peak (after 10 ms delay), pre-stimulus RMS
//!   ├─ exclusion                    RMS threshold (mean + k·SD) | IQR on blocks 2, 4, 6
//!   ├─ normalize                    ÷ reference-block mean, ÷ resting-period mean
//!   ├─ context                      context label, last_was_error
//!   └─ table::TrialTable            one row per pulse; sentinel 99999 only on export
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use mep::{process_recording, PipelineConfig};
//! use mep::io::load_recording;
//!
//! let rec   = load_recording("V15.safetensors").unwrap();
//! let table = process_recording(&rec, &PipelineConfig::default()).unwrap();
//!
//! for trial in table.trials.iter().take(5) {
//!     println!("{} {:?} {:?}", trial.play, trial.fdi.amplitude_uv, trial.context);
//! }
//! ```
//!
//! ## Running individual steps
//!
//! ```
//! use mep::amplitude::{peak_to_peak, rms};
//! use mep::window::extract_window;
//! use ndarray::Array1;
//!
//! let emg = Array1::from_shape_fn(3000, |i| ((i as f64) * 0.3).sin() * 1e-4);
//! let w = extract_window(emg.view(), 1500, 30, 180).unwrap();
//! assert_eq!(w.len(), 210);
//! assert!(peak_to_peak(w, 30).unwrap() > 0.0);
//! assert!(rms(w) > 0.0);
//! ```

pub mod amplitude;
pub mod blocks;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod exclusion;
pub mod io;
pub mod normalize;
pub mod recording;
pub mod response;
pub mod summary;
pub mod table;
pub mod window;

use tracing::{debug, info, warn};

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use amplitude::{
    measure_rest_pulses, measure_triggers, peak_to_peak, rms, AmplitudeSample, ChannelAmplitudes,
    RestAmplitudes,
};
pub use blocks::{BlockId, BlockSchedule, Condition};
pub use config::{AmplitudeFloor, ExclusionMethod, PipelineConfig};
pub use context::{context_labels, last_was_error, ContextLabel};
pub use error::{MepError, PulseRef, Result};
pub use events::{combine_choice_events, extract, ChoiceEvent, EventStream, Marker, MarkerCode};
pub use exclusion::{ExclusionPolicy, IqrBounds};
pub use normalize::{normalize_by_mean, normalize_by_rest};
pub use recording::{Channel, Recording};
pub use response::{match_responses, Outcome, ResponseMatch, Symbol};
pub use table::{ChannelResult, Trial, TrialTable, MISSING_SENTINEL};
pub use window::{extract_rms_window, extract_window, WindowSpec};

/// Run the full extraction pipeline on a single recording.
///
/// # Pipeline steps
///
/// 1. Sort markers and drop everything before the first stimulus marker.
/// 2. Split stimulus markers delivered back to back (resting period) from
///    the in-game stream; drop [`PipelineConfig::spurious_triggers`].
/// 3. Match every arrow onset to the following choice markers.
/// 4. Measure peak-to-peak and pre-stimulus RMS at every in-game pulse, and
///    peak-to-peak only at every rest pulse
///    ([`PipelineConfig::rest_triggers`] replaces the detected ones).
/// 5. Apply the amplitude floor, then the configured exclusion policy per
///    channel.
/// 6. Convert to µV and normalise by the reference-block mean and, when rest
///    pulses exist, by the resting-period mean.
/// 7. Label context and `last_was_error` from the presented sequence,
///    skipping familiarisation trials unless
///    [`PipelineConfig::label_familiarization`] is set.  Response times above
///    [`PipelineConfig::max_response_time_s`] become missing.
///
/// # Errors
///
/// * The number of arrow onsets, in-game pulses and block-schedule trials
///   must agree ([`MepError::LengthMismatch`]).
/// * Any window outside the recording, a delay longer than the window, or
///   an empty reference subset aborts the recording.
/// * A missing symbol needed for labelling ([`MepError::MissingField`]).
pub fn process_recording(rec: &Recording, cfg: &PipelineConfig) -> Result<TrialTable> {
    cfg.validate(rec.sfreq)?;
    let spec = WindowSpec {
        before: cfg.samples_before(rec.sfreq),
        after: cfg.samples_after(rec.sfreq),
        before_rms: cfg.samples_before_rms(rec.sfreq),
    };
    let delay = cfg.delay_samples(rec.sfreq);

    // 1–2. Events.
    let events = rec.events().from_first(MarkerCode::Stimulus);
    let (rest, game) = events.split_rest_stimuli();
    let game = game.without_stimuli_at(&cfg.spurious_triggers);

    // 3. Behaviour.
    let onsets = game.extract(MarkerCode::ArrowOnset);
    let responses = match_responses(&onsets, &game.choice_events(), rec.sfreq);
    let triggers = game.samples_of(MarkerCode::Stimulus);
    error::ensure_len("arrow onsets", responses.len(), triggers.len())?;
    let blocks = cfg.block_schedule.tags_for(triggers.len())?;
    info!(
        n_trials = triggers.len(),
        n_rest = rest.len(),
        incomplete = responses.iter().filter(|r| !r.is_complete()).count(),
        "events extracted"
    );

    // 4–5. Amplitudes, floor and exclusion.
    let raw = measure_triggers(rec, &triggers, &spec, delay)?;
    let floored = raw.try_map(|ch, s| {
        Ok(match cfg.min_amplitude_uv.get(ch) {
            Some(min) => exclusion::exclude_below(s, min, cfg.unit_scale),
            None => s.to_vec(),
        })
    })?;
    let policy = cfg.exclusion_policy();
    let kept = floored.try_map(|_, s| policy.apply(s, &blocks))?;

    let rest_samples = match &cfg.rest_triggers {
        Some(pulses) => {
            info!(n_rest = pulses.len(), "using configured rest pulses");
            pulses.clone()
        }
        None => rest.samples_of(MarkerCode::Stimulus),
    };
    let rest_amps = if rest_samples.is_empty() {
        warn!("no resting-period pulses; relRest columns left empty");
        None
    } else {
        Some(measure_rest_pulses(rec, &rest_samples, &spec, delay)?)
    };

    // 6. Normalisation.
    let mut per_channel = Vec::with_capacity(Channel::ALL.len());
    let mut rest_uv = Vec::with_capacity(Channel::ALL.len());
    for ch in Channel::ALL {
        let rest = rest_amps
            .as_ref()
            .map(|r| normalize::rest_amplitude(r.get(ch), cfg.unit_scale))
            .transpose()?;
        per_channel.push(channel_results(kept.get(ch), &blocks, rest, cfg)?);
        rest_uv.push(rest);
        debug!(channel = ch.name(), rest_uv = ?rest, "channel normalised");
    }

    // 7. Labels.
    let sequence: Vec<Option<Symbol>> = responses.iter().map(|r| r.sequence).collect();
    let outcomes = response::outcomes(&responses);
    let labelled: Vec<usize> = (0..triggers.len())
        .filter(|&i| {
            cfg.label_familiarization || Condition::of(blocks[i]) != Some(Condition::Familiarization)
        })
        .collect();
    let (context, last_error) = trial_labels(&blocks, &sequence, &outcomes, &labelled)?;

    let response_times: Vec<Option<f64>> = responses
        .iter()
        .map(|r| {
            r.response_time_s
                .filter(|&rt| cfg.max_response_time_s.map_or(true, |max| rt <= max))
        })
        .collect();
    let too_slow = responses.iter().filter(|r| r.response_time_s.is_some()).count()
        - response_times.iter().filter(|rt| rt.is_some()).count();
    if too_slow > 0 {
        debug!(too_slow, max = ?cfg.max_response_time_s, "response times above ceiling dropped");
    }

    let trials = (0..triggers.len())
        .map(|i| Trial {
            play: i + 1,
            stimulus_sample: triggers[i],
            block: blocks[i],
            response_time_s: response_times[i],
            sequence: responses[i].sequence,
            choice: responses[i].choice,
            outcome: outcomes[i],
            fdi: per_channel[0][i],
            fds: per_channel[1][i],
            context: context[i],
            last_was_error: last_error[i],
        })
        .collect();

    Ok(TrialTable {
        participant: cfg.participant,
        trials,
        rest_fdi_uv: rest_uv[0],
        rest_fds_uv: rest_uv[1],
    })
}

/// Context and `last_was_error` computed over the trials in `labelled`
/// only, scattered back to full length.  Other trials stay unlabelled.
fn trial_labels(
    blocks: &[BlockId],
    sequence: &[Option<Symbol>],
    outcomes: &[Option<Outcome>],
    labelled: &[usize],
) -> Result<(Vec<Option<ContextLabel>>, Vec<bool>)> {
    let pick = |v: &[Option<Symbol>]| labelled.iter().map(|&i| v[i]).collect::<Vec<_>>();
    let sub_blocks: Vec<BlockId> = labelled.iter().map(|&i| blocks[i]).collect();
    let sub_sequence = pick(sequence);
    let sub_outcomes: Vec<Option<Outcome>> = labelled.iter().map(|&i| outcomes[i]).collect();

    // MissingField indices refer to the subset.
    let remap = |e: MepError| match e {
        MepError::MissingField { trial, field } => MepError::MissingField {
            trial: labelled[trial],
            field,
        },
        other => other,
    };
    let sub_context = context_labels(&sub_blocks, &sub_sequence).map_err(remap)?;
    let sub_error = last_was_error(&sub_sequence, &sub_outcomes).map_err(remap)?;

    let mut context = vec![None; blocks.len()];
    let mut last_error = vec![false; blocks.len()];
    for (k, &i) in labelled.iter().enumerate() {
        context[i] = sub_context[k];
        last_error[i] = sub_error[k];
    }
    Ok((context, last_error))
}

/// µV amplitudes and both normalisations for one channel.
fn channel_results(
    samples: &[AmplitudeSample],
    blocks: &[BlockId],
    rest_uv: Option<f64>,
    cfg: &PipelineConfig,
) -> Result<Vec<ChannelResult>> {
    let uv = normalize::scale(&amplitude::values(samples), cfg.unit_scale);
    let rel_mean = normalize_by_mean(&uv, blocks, &cfg.reference_blocks, cfg.sanity_ceiling)?;
    let rel_rest = match rest_uv {
        Some(r) => normalize_by_rest(&uv, r)?,
        None => vec![None; uv.len()],
    };
    Ok(samples
        .iter()
        .enumerate()
        .map(|(i, &sample)| ChannelResult {
            sample,
            amplitude_uv: uv[i],
            rel_mean: rel_mean[i],
            rel_rest: rel_rest[i],
        })
        .collect())
}
