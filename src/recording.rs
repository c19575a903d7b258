//! In-memory recording handed over by the loader.
use ndarray::{Array2, ArrayView1};

use crate::error::{MepError, Result};
use crate::events::{EventStream, Marker};

/// EMG channels analysed by the pipeline, in recording row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// First dorsal interosseous.
    Fdi,
    /// Flexor digitorum superficialis.
    Fds,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Fdi, Channel::Fds];

    /// Row of this channel in the `[C, T]` data array.
    pub fn row(self) -> usize {
        match self {
            Channel::Fdi => 0,
            Channel::Fds => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Fdi => "FDI",
            Channel::Fds => "FDS",
        }
    }
}

/// A continuous recording: samples, sampling rate and markers.
#[derive(Debug, Clone)]
pub struct Recording {
    /// `[C, T]` samples in recording units (volts for BrainVision EMG).
    pub data: Array2<f64>,
    /// Sampling rate in Hz.
    pub sfreq: f64,
    /// Markers in emission order.
    pub markers: Vec<Marker>,
}

impl Recording {
    pub fn new(data: Array2<f64>, sfreq: f64, markers: Vec<Marker>) -> Result<Self> {
        if data.nrows() < Channel::ALL.len() {
            return Err(MepError::MissingChannel {
                found: data.nrows(),
                needed: Channel::ALL.len(),
            });
        }
        Ok(Self { data, sfreq, markers })
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Samples of one channel.
    pub fn channel(&self, ch: Channel) -> ArrayView1<'_, f64> {
        self.data.row(ch.row())
    }

    /// Markers as a sorted stream.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.markers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_channel_rejected() {
        let err = Recording::new(Array2::zeros((1, 10)), 1000.0, vec![]).unwrap_err();
        assert_eq!(err, MepError::MissingChannel { found: 1, needed: 2 });
    }

    #[test]
    fn channel_rows() {
        let data = Array2::from_shape_fn((2, 4), |(c, t)| (c * 10 + t) as f64);
        let rec = Recording::new(data, 1000.0, vec![]).unwrap();
        assert_eq!(rec.channel(Channel::Fds)[3], 13.0);
        assert_eq!(rec.n_samples(), 4);
    }
}
