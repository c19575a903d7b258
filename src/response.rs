//! Response-time matching and choice outcome.
//!
//! For every arrow onset the next choice marker is the symbol the
//! goalkeeper was shown (the "sequence" symbol), and the marker after that is
//! the symbol the participant picked.
use serde::{Deserialize, Serialize};

use crate::events::{ChoiceEvent, Marker};

/// The three-letter alphabet of the goalkeeper game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Zero,
    One,
    Two,
}

impl Symbol {
    pub fn value(self) -> u8 {
        match self {
            Symbol::Zero => 0,
            Symbol::One => 1,
            Symbol::Two => 2,
        }
    }

    pub fn from_value(v: u8) -> Option<Self> {
        match v {
            0 => Some(Symbol::Zero),
            1 => Some(Symbol::One),
            2 => Some(Symbol::Two),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn is_error(self) -> bool {
        self == Outcome::Incorrect
    }
}

/// Result of matching one onset against the choice stream.
///
/// `response_time_s` and `sequence` are `None` together (no forward marker);
/// `choice` can be `None` on its own when the stream ends right after the
/// sequence marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseMatch {
    pub response_time_s: Option<f64>,
    pub sequence: Option<Symbol>,
    pub choice: Option<Symbol>,
}

impl ResponseMatch {
    pub fn is_complete(&self) -> bool {
        self.sequence.is_some() && self.choice.is_some()
    }

    /// `Correct` iff both symbols are present and equal.
    pub fn outcome(&self) -> Option<Outcome> {
        match (self.sequence, self.choice) {
            (Some(s), Some(c)) if s == c => Some(Outcome::Correct),
            (Some(_), Some(_)) => Some(Outcome::Incorrect),
            _ => None,
        }
    }
}

/// Match each onset to the first two choice markers strictly after it.
///
/// `choices` must be sorted by sample (as produced by
/// [`combine_choice_events`](crate::events::combine_choice_events)).
/// The output has exactly one entry per onset, in onset order.
pub fn match_responses(onsets: &[Marker], choices: &[ChoiceEvent], sfreq: f64) -> Vec<ResponseMatch> {
    onsets
        .iter()
        .map(|onset| {
            let next = choices.partition_point(|e| e.sample <= onset.sample);
            match choices.get(next) {
                Some(first) => ResponseMatch {
                    response_time_s: Some((first.sample - onset.sample) as f64 / sfreq),
                    sequence: Some(first.symbol),
                    choice: choices.get(next + 1).map(|e| e.symbol),
                },
                None => ResponseMatch {
                    response_time_s: None,
                    sequence: None,
                    choice: None,
                },
            }
        })
        .collect()
}

/// Outcome for every match.
pub fn outcomes(matches: &[ResponseMatch]) -> Vec<Option<Outcome>> {
    matches.iter().map(ResponseMatch::outcome).collect()
}
