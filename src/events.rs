//! Marker streams: filtering, partitioning and merging of choice markers.
//!
//! The recording device emits one flat list of `(sample, code)` markers.
//! Everything downstream works on ordered subsequences of that list:
//!
//! ```text
//! markers ──► EventStream (sorted, stable)
//!               ├─ from_first(Stimulus)      drop the warm-up before the first pulse
//!               ├─ split_rest_stimuli()      runs of consecutive pulses = resting period
//!               ├─ extract(ArrowOnset)       onsets for the response matcher
//!               ├─ extract(Stimulus)         MEP triggers
//!               └─ combine_choice_events()   G2 / G4 / G8 merged by sample
//! ```
use serde::{Deserialize, Serialize};

use crate::response::Symbol;

/// Marker codes emitted by the task computer.
///
/// The numeric ids are those assigned by the annotation reader
/// (`Display/D 1` → 1, …, `Gkg/G 8` → 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerCode {
    /// `D1`: a new trial starts.
    TrialStart,
    /// `D2`: the arrows appear on screen.
    ArrowOnset,
    /// `D4`: a TMS pulse was delivered.
    Stimulus,
    /// `G2` / `G4` / `G8`: one of the three goalkeeper symbols.
    Choice(Symbol),
    /// Any id this pipeline does not interpret.
    Other(u32),
}

impl MarkerCode {
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => MarkerCode::TrialStart,
            2 => MarkerCode::ArrowOnset,
            4 => MarkerCode::Stimulus,
            6 => MarkerCode::Choice(Symbol::Zero),
            7 => MarkerCode::Choice(Symbol::One),
            8 => MarkerCode::Choice(Symbol::Two),
            other => MarkerCode::Other(other),
        }
    }

    pub fn id(self) -> u32 {
        match self {
            MarkerCode::TrialStart => 1,
            MarkerCode::ArrowOnset => 2,
            MarkerCode::Stimulus => 4,
            MarkerCode::Choice(Symbol::Zero) => 6,
            MarkerCode::Choice(Symbol::One) => 7,
            MarkerCode::Choice(Symbol::Two) => 8,
            MarkerCode::Other(id) => id,
        }
    }
}

/// A single timestamped marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Sample index in the continuous recording.
    pub sample: usize,
    pub code: MarkerCode,
}

impl Marker {
    pub fn new(sample: usize, code: MarkerCode) -> Self {
        Self { sample, code }
    }
}

/// One entry of the merged choice stream: a symbol marker with its sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceEvent {
    pub sample: usize,
    pub symbol: Symbol,
}

/// Markers ordered by sample index, ties kept in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStream {
    markers: Vec<Marker>,
}

impl EventStream {
    /// Build a stream from markers in emission order.
    ///
    /// Uses a stable sort, so markers sharing a sample keep the order in which
    /// the device emitted them.
    pub fn new(mut markers: Vec<Marker>) -> Self {
        markers.sort_by_key(|m| m.sample);
        Self { markers }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Every marker whose code equals `code`, in stream order.
    pub fn extract(&self, code: MarkerCode) -> Vec<Marker> {
        extract(&self.markers, code)
    }

    /// Drop every marker before the first occurrence of `code`.
    ///
    /// Returns an empty stream when `code` never occurs.
    pub fn from_first(&self, code: MarkerCode) -> EventStream {
        let start = self
            .markers
            .iter()
            .position(|m| m.code == code)
            .unwrap_or(self.markers.len());
        EventStream {
            markers: self.markers[start..].to_vec(),
        }
    }

    /// Partition into `(rest, in_game)`.
    ///
    /// Pulses delivered during the resting period arrive back to back, with no
    /// game markers in between.  A stimulus marker whose immediate neighbour
    /// (previous or next) is also a stimulus marker belongs to the rest
    /// stream; every other marker stays in the in-game stream.
    pub fn split_rest_stimuli(&self) -> (EventStream, EventStream) {
        let is_stim: Vec<bool> = self
            .markers
            .iter()
            .map(|m| m.code == MarkerCode::Stimulus)
            .collect();
        let n = is_stim.len();

        let mut rest = Vec::new();
        let mut in_game = Vec::new();
        for (i, m) in self.markers.iter().enumerate() {
            let prev = i > 0 && is_stim[i - 1];
            let next = i + 1 < n && is_stim[i + 1];
            if is_stim[i] && (prev || next) {
                rest.push(*m);
            } else {
                in_game.push(*m);
            }
        }
        (EventStream { markers: rest }, EventStream { markers: in_game })
    }

    /// Remove stimulus markers at the listed samples.
    ///
    /// Used for hardware glitches where the stimulator emitted a spurious
    /// pulse marker that has no matching trial.
    pub fn without_stimuli_at(&self, samples: &[usize]) -> EventStream {
        let markers = self
            .markers
            .iter()
            .filter(|m| !(m.code == MarkerCode::Stimulus && samples.contains(&m.sample)))
            .copied()
            .collect();
        EventStream { markers }
    }

    /// Merge the three choice-symbol streams contained in this stream.
    pub fn choice_events(&self) -> Vec<ChoiceEvent> {
        combine_choice_events(
            &self.extract(MarkerCode::Choice(Symbol::Zero)),
            &self.extract(MarkerCode::Choice(Symbol::One)),
            &self.extract(MarkerCode::Choice(Symbol::Two)),
        )
    }

    /// Sample indices of all markers with `code`.
    pub fn samples_of(&self, code: MarkerCode) -> Vec<usize> {
        self.markers
            .iter()
            .filter(|m| m.code == code)
            .map(|m| m.sample)
            .collect()
    }
}

/// Every marker in `markers` whose code equals `code`, in input order.
pub fn extract(markers: &[Marker], code: MarkerCode) -> Vec<Marker> {
    markers.iter().filter(|m| m.code == code).copied().collect()
}

/// Merge three per-symbol marker lists into one stream sorted by sample.
///
/// Each marker is tagged with the symbol of the list it came from, whatever
/// its own code says.  The sort is stable and the lists are concatenated in
/// `zero, one, two` order, so a cross-symbol tie keeps that order.
pub fn combine_choice_events(
    zero: &[Marker],
    one: &[Marker],
    two: &[Marker],
) -> Vec<ChoiceEvent> {
    let tag = |markers: &[Marker], symbol: Symbol| {
        markers
            .iter()
            .map(move |m| ChoiceEvent { sample: m.sample, symbol })
            .collect::<Vec<_>>()
    };

    let mut combined = tag(zero, Symbol::Zero);
    combined.extend(tag(one, Symbol::One));
    combined.extend(tag(two, Symbol::Two));
    combined.sort_by_key(|e| e.sample);
    combined
}
