//! Behavioural summaries over a trial sequence.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::blocks::{BlockId, Condition};
use crate::error::{ensure_len, Result};
use crate::response::Outcome;

/// Proportion of correct trials among trials with a known outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuccessRate {
    pub rate: f64,
    /// Sample standard deviation of the 0/1 correctness indicator.
    pub std: f64,
    pub n: usize,
}

/// Success rate over `outcomes`, or `None` when no outcome is known.
pub fn success_rate(outcomes: &[Option<Outcome>]) -> Option<SuccessRate> {
    let hits: Vec<f64> = outcomes
        .iter()
        .flatten()
        .map(|o| if *o == Outcome::Correct { 1.0 } else { 0.0 })
        .collect();
    let n = hits.len();
    if n == 0 {
        return None;
    }
    let rate = hits.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        (hits.iter().map(|h| (h - rate).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        f64::NAN
    };
    Some(SuccessRate { rate, std, n })
}

/// Success rate ignoring the first and last `exclude` trials.
pub fn success_rate_trimmed(outcomes: &[Option<Outcome>], exclude: usize) -> Option<SuccessRate> {
    if outcomes.len() <= 2 * exclude {
        return None;
    }
    success_rate(&outcomes[exclude..outcomes.len() - exclude])
}

/// Success rate of each block.
pub fn success_rate_by_block(
    blocks: &[BlockId],
    outcomes: &[Option<Outcome>],
) -> Result<BTreeMap<BlockId, SuccessRate>> {
    ensure_len("outcomes", outcomes.len(), blocks.len())?;
    let mut grouped: BTreeMap<BlockId, Vec<Option<Outcome>>> = BTreeMap::new();
    for (&b, &o) in blocks.iter().zip(outcomes) {
        grouped.entry(b).or_default().push(o);
    }
    Ok(grouped
        .into_iter()
        .filter_map(|(b, os)| success_rate(&os).map(|r| (b, r)))
        .collect())
}

/// Mean block success rate of the no-pulse and pulse blocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PulseComparison {
    pub no_pulse: Option<f64>,
    pub pulse: Option<f64>,
}

pub fn pulse_comparison(by_block: &BTreeMap<BlockId, SuccessRate>) -> PulseComparison {
    let mean_of = |condition: Condition| {
        let rates: Vec<f64> = by_block
            .iter()
            .filter(|(b, _)| Condition::of(**b) == Some(condition))
            .map(|(_, r)| r.rate)
            .collect();
        (!rates.is_empty()).then(|| rates.iter().sum::<f64>() / rates.len() as f64)
    };
    PulseComparison {
        no_pulse: mean_of(Condition::NoPulse),
        pulse: mean_of(Condition::Pulse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Outcome::{Correct, Incorrect};

    #[test]
    fn rate_ignores_unknown() {
        let r = success_rate(&[Some(Correct), None, Some(Incorrect), Some(Correct)]).unwrap();
        assert_eq!(r.n, 3);
        approx::assert_abs_diff_eq!(r.rate, 2.0 / 3.0, epsilon = 1e-12);
        assert!(success_rate(&[None]).is_none());
    }

    #[test]
    fn trimmed_rate() {
        let o = [Some(Incorrect), Some(Correct), Some(Correct), Some(Incorrect)];
        assert_eq!(success_rate_trimmed(&o, 1).unwrap().rate, 1.0);
        assert!(success_rate_trimmed(&o, 2).is_none());
    }

    #[test]
    fn by_block_and_pulse_means() {
        let blocks = [0, 1, 1, 2, 2, 3, 4];
        let o = [
            Some(Incorrect),
            Some(Correct),
            Some(Incorrect),
            Some(Correct),
            Some(Correct),
            Some(Correct),
            Some(Incorrect),
        ];
        let by = success_rate_by_block(&blocks, &o).unwrap();
        assert_eq!(by[&1].rate, 0.5);
        assert_eq!(by[&2].rate, 1.0);
        let cmp = pulse_comparison(&by);
        assert_eq!(cmp.no_pulse, Some(0.75));
        assert_eq!(cmp.pulse, Some(0.5));
    }
}
