//! Trial-history labels: `context` and `last_was_error`.
//!
//! Both labels are derived from the presented-symbol sequence and must be
//! computed in a single ascending pass over the trials.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blocks::BlockId;
use crate::error::{ensure_len, MepError, Result};
use crate::response::{Outcome, Symbol};

/// Recent history of presented symbols.
///
/// `One`/`Two`: the previous symbol was 1 or 2.  When the previous symbol
/// was 0 the label looks one trial further back: `ZeroZero`, `OneZero`,
/// `TwoZero` for `0,0`, `1,0` and `2,0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextLabel {
    #[serde(rename = "00")]
    ZeroZero,
    #[serde(rename = "10")]
    OneZero,
    #[serde(rename = "20")]
    TwoZero,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
}

impl ContextLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextLabel::ZeroZero => "00",
            ContextLabel::OneZero => "10",
            ContextLabel::TwoZero => "20",
            ContextLabel::One => "1",
            ContextLabel::Two => "2",
        }
    }
}

impl fmt::Display for ContextLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn require<T: Copy>(v: &[Option<T>], trial: usize, field: &'static str) -> Result<T> {
    v[trial].ok_or(MepError::MissingField { trial, field })
}

/// Context label of every trial.
///
/// The first trial of each block is unlabelled; the lookback never reaches
/// into a previous block, so a `0` as the first symbol of a block leaves the
/// following trial unlabelled as well.
pub fn context_labels(blocks: &[BlockId], sequence: &[Option<Symbol>]) -> Result<Vec<Option<ContextLabel>>> {
    ensure_len("sequence symbols", sequence.len(), blocks.len())?;
    let mut labels = vec![None; sequence.len()];

    for i in 1..sequence.len() {
        if blocks[i] != blocks[i - 1] {
            continue;
        }
        labels[i] = match require(sequence, i - 1, "sequence symbol")? {
            Symbol::One => Some(ContextLabel::One),
            Symbol::Two => Some(ContextLabel::Two),
            Symbol::Zero => {
                if i < 2 || blocks[i - 2] != blocks[i] {
                    None
                } else {
                    Some(match require(sequence, i - 2, "sequence symbol")? {
                        Symbol::Zero => ContextLabel::ZeroZero,
                        Symbol::One => ContextLabel::OneZero,
                        Symbol::Two => ContextLabel::TwoZero,
                    })
                }
            }
        };
    }
    Ok(labels)
}

/// `last_was_error` flag of every trial.
///
/// Whenever trial `i − 1` presented symbol 1, the error status of trial `i`
/// is written to trials `i`, `i + 1` and `i + 2` (those in bounds).  Trials
/// are visited in ascending order and later writes overwrite earlier ones.
/// Trials never written stay `false`.
pub fn last_was_error(sequence: &[Option<Symbol>], outcomes: &[Option<Outcome>]) -> Result<Vec<bool>> {
    ensure_len("outcomes", outcomes.len(), sequence.len())?;
    let n = sequence.len();
    let mut flags = vec![false; n];

    for i in 1..n {
        if require(sequence, i - 1, "sequence symbol")? != Symbol::One {
            continue;
        }
        let is_error = require(outcomes, i, "outcome")?.is_error();
        for slot in flags.iter_mut().skip(i).take(3) {
            *slot = is_error;
        }
    }
    Ok(flags)
}
