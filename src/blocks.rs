//! Block tags and stimulation conditions.
//!
//! The task is split into a short familiarisation block (0) followed by
//! alternating no-pulse (1, 3, 5) and pulse (2, 4, 6) blocks.
use serde::{Deserialize, Serialize};

use crate::error::{MepError, Result};

/// Integer tag of a block.
pub type BlockId = u32;

/// Blocks in which a TMS pulse was delivered on every trial.
pub const PULSE_BLOCKS: [BlockId; 3] = [2, 4, 6];

/// Blocks played without stimulation.
pub const NO_PULSE_BLOCKS: [BlockId; 3] = [1, 3, 5];

/// Stimulation condition of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Familiarization,
    NoPulse,
    Pulse,
}

impl Condition {
    /// Condition of `block`, or `None` for tags outside the protocol.
    pub fn of(block: BlockId) -> Option<Self> {
        match block {
            0 => Some(Condition::Familiarization),
            b if NO_PULSE_BLOCKS.contains(&b) => Some(Condition::NoPulse),
            b if PULSE_BLOCKS.contains(&b) => Some(Condition::Pulse),
            _ => None,
        }
    }
}

/// Layout of trials into blocks for one session.
///
/// Default: 11 familiarisation trials, then 6 blocks of 199 trials
/// (1 205 trials in total).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockSchedule {
    /// Trials tagged with block 0 at the start of the session.
    pub familiarization_trials: usize,
    /// Trials per numbered block.
    pub trials_per_block: usize,
    /// Number of numbered blocks (tagged `1..=blocks`).
    pub blocks: usize,
}

impl Default for BlockSchedule {
    fn default() -> Self {
        Self {
            familiarization_trials: 11,
            trials_per_block: 199,
            blocks: 6,
        }
    }
}

impl BlockSchedule {
    /// Total number of trials described by the schedule.
    pub fn n_trials(&self) -> usize {
        self.familiarization_trials + self.trials_per_block * self.blocks
    }

    /// One block tag per trial.
    pub fn tags(&self) -> Vec<BlockId> {
        let mut tags = vec![0; self.familiarization_trials];
        for b in 1..=self.blocks {
            tags.extend(std::iter::repeat(b as BlockId).take(self.trials_per_block));
        }
        tags
    }

    /// Tags for exactly `n_trials` trials, failing when the schedule disagrees.
    pub fn tags_for(&self, n_trials: usize) -> Result<Vec<BlockId>> {
        if self.n_trials() != n_trials {
            return Err(MepError::LengthMismatch {
                what: "block schedule",
                left: self.n_trials(),
                right: n_trials,
            });
        }
        Ok(self.tags())
    }
}
