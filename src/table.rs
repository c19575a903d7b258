//! Per-trial output table and its export columns.
//!
//! Inside the crate a missing value is always `None`.  Only
//! [`TrialTable::export_columns`] replaces it with [`MISSING_SENTINEL`], for
//! downstream tools that cannot read empty numeric cells.
use std::collections::BTreeMap;

use crate::amplitude::AmplitudeSample;
use crate::blocks::BlockId;
use crate::context::ContextLabel;
use crate::recording::Channel;
use crate::response::{Outcome, Symbol};

/// Value written in place of a missing number on export.
pub const MISSING_SENTINEL: f64 = 99999.0;

/// Amplitude results of one trial on one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelResult {
    /// Raw measurement with its validity flag.
    pub sample: AmplitudeSample,
    /// Peak-to-peak in µV, `None` if excluded.
    pub amplitude_uv: Option<f64>,
    /// Amplitude relative to the reference-block mean.
    pub rel_mean: Option<f64>,
    /// Amplitude relative to the resting-period mean.
    pub rel_rest: Option<f64>,
}

/// One row of the output table.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    /// 1-based trial number.
    pub play: usize,
    /// Sample of the stimulus marker.
    pub stimulus_sample: usize,
    pub block: BlockId,
    pub response_time_s: Option<f64>,
    pub sequence: Option<Symbol>,
    pub choice: Option<Symbol>,
    pub outcome: Option<Outcome>,
    pub fdi: ChannelResult,
    pub fds: ChannelResult,
    pub context: Option<ContextLabel>,
    pub last_was_error: bool,
}

impl Trial {
    pub fn channel(&self, ch: Channel) -> &ChannelResult {
        match ch {
            Channel::Fdi => &self.fdi,
            Channel::Fds => &self.fds,
        }
    }
}

/// One exported column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All trials of one recording plus recording-level values.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialTable {
    pub participant: u32,
    pub trials: Vec<Trial>,
    /// Mean resting-period MEP (µV) of FDI, if rest pulses were recorded.
    pub rest_fdi_uv: Option<f64>,
    /// Mean resting-period MEP (µV) of FDS, if rest pulses were recorded.
    pub rest_fds_uv: Option<f64>,
}

impl TrialTable {
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn blocks(&self) -> Vec<BlockId> {
        self.trials.iter().map(|t| t.block).collect()
    }

    pub fn outcomes(&self) -> Vec<Option<Outcome>> {
        self.trials.iter().map(|t| t.outcome).collect()
    }

    /// Numeric columns with `None` for missing values.
    pub fn numeric_columns(&self) -> Vec<(&'static str, Vec<Option<f64>>)> {
        let sym = |s: Option<Symbol>| s.map(|s| f64::from(s.value()));
        let col = |f: fn(&Trial) -> Option<f64>| self.trials.iter().map(f).collect::<Vec<_>>();
        let n = self.trials.len();

        vec![
            ("ID_info", vec![Some(f64::from(self.participant)); n]),
            ("play_info", col(|t| Some(t.play as f64))),
            ("block_info", col(|t| Some(f64::from(t.block)))),
            ("response_time_info", col(|t| t.response_time_s)),
            ("response_info", self.trials.iter().map(|t| sym(t.choice)).collect()),
            ("stochastic_chain_info", self.trials.iter().map(|t| sym(t.sequence)).collect()),
            ("MEPpp_FDI_µV", col(|t| t.fdi.amplitude_uv)),
            ("MEPpp_FDS_µV", col(|t| t.fds.amplitude_uv)),
            ("relRest_MEPpp_FDI", col(|t| t.fdi.rel_rest)),
            ("relRest_MEPpp_FDS", col(|t| t.fds.rel_rest)),
            ("relMean_MEPpp_FDI", col(|t| t.fdi.rel_mean)),
            ("relMean_MEPpp_FDS", col(|t| t.fds.rel_mean)),
            ("FDImep_outGame", vec![self.rest_fdi_uv; n]),
            ("FDSmep_outGame", vec![self.rest_fds_uv; n]),
            ("last_was_error", col(|t| Some(if t.last_was_error { 1.0 } else { 0.0 }))),
        ]
    }

    /// Number of missing values per numeric column.
    pub fn missing_counts(&self) -> BTreeMap<&'static str, usize> {
        self.numeric_columns()
            .into_iter()
            .map(|(name, v)| (name, v.iter().filter(|x| x.is_none()).count()))
            .collect()
    }

    /// Export columns, with missing numbers replaced by [`MISSING_SENTINEL`]
    /// and missing context labels written as empty strings.
    pub fn export_columns(&self) -> Vec<(&'static str, Column)> {
        let mut out: Vec<(&'static str, Column)> = self
            .numeric_columns()
            .into_iter()
            .map(|(name, v)| {
                let filled = v.into_iter().map(|x| x.unwrap_or(MISSING_SENTINEL)).collect();
                (name, Column::Numeric(filled))
            })
            .collect();
        let context = self
            .trials
            .iter()
            .map(|t| t.context.map(|c| c.as_str().to_string()).unwrap_or_default())
            .collect();
        out.push(("context", Column::Text(context)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(v: Option<f64>) -> ChannelResult {
        ChannelResult {
            sample: AmplitudeSample::new(v.unwrap_or(0.0), 0.0),
            amplitude_uv: v,
            rel_mean: v.map(|x| x / 10.0),
            rel_rest: None,
        }
    }

    fn table() -> TrialTable {
        let trial = |play, v, ctx| Trial {
            play,
            stimulus_sample: play * 100,
            block: 2,
            response_time_s: Some(0.4),
            sequence: Some(Symbol::One),
            choice: None,
            outcome: None,
            fdi: result(v),
            fds: result(Some(5.0)),
            context: ctx,
            last_was_error: play == 2,
        };
        TrialTable {
            participant: 15,
            trials: vec![trial(1, Some(20.0), None), trial(2, None, Some(ContextLabel::One))],
            rest_fdi_uv: Some(40.0),
            rest_fds_uv: None,
        }
    }

    #[test]
    fn sentinel_only_on_export() {
        let t = table();
        let cols = t.export_columns();
        let get = |name: &str| cols.iter().find(|(n, _)| *n == name).map(|(_, c)| c.clone()).unwrap();

        assert_eq!(get("MEPpp_FDI_µV"), Column::Numeric(vec![20.0, MISSING_SENTINEL]));
        assert_eq!(get("response_info"), Column::Numeric(vec![MISSING_SENTINEL; 2]));
        assert_eq!(get("FDSmep_outGame"), Column::Numeric(vec![MISSING_SENTINEL; 2]));
        assert_eq!(get("last_was_error"), Column::Numeric(vec![0.0, 1.0]));
        assert_eq!(get("context"), Column::Text(vec![String::new(), "1".into()]));
        assert!(cols.iter().all(|(_, c)| c.len() == 2));
    }

    #[test]
    fn missing_counts_per_column() {
        let counts = table().missing_counts();
        assert_eq!(counts["MEPpp_FDI_µV"], 1);
        assert_eq!(counts["relRest_MEPpp_FDS"], 2);
        assert_eq!(counts["ID_info"], 0);
    }
}
