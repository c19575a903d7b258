//! Safetensors I/O for recordings and trial tables.
//!
//! Reader: `recording.safetensors` as written by the export script next to
//! each BrainVision session:
//!
//! | key       | dtype     | shape    | content                         |
//! |-----------|-----------|----------|---------------------------------|
//! | `data`    | F32 / F64 | `[C, T]` | EMG samples, FDI row 0, FDS row 1 |
//! | `sfreq`   | F32 / F64 | `[1]`    | sampling rate (Hz)              |
//! | `markers` | I32 / I64 | `[N, 2]` | `(sample, marker id)` rows       |
//!
//! Writer: one tensor per table column (F64; text columns as newline-joined
//! U8 bytes).
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::Path;

use crate::events::{Marker, MarkerCode};
use crate::recording::Recording;
use crate::table::{Column, TrialTable};

// ── Low-level safetensors parser ──────────────────────────────────────────

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, serde_json::Value>, usize)> {
    if bytes.len() < 8 {
        bail!("safetensors file too small");
    }
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let end = usize::try_from(u64::from_le_bytes(len))
        .ok()
        .and_then(|n| n.checked_add(8))
        .context("safetensors header length overflows")?;
    if bytes.len() < end {
        bail!("safetensors header truncated");
    }
    let header: HashMap<String, serde_json::Value> =
        serde_json::from_slice(&bytes[8..end]).context("failed to parse safetensors header")?;
    Ok((header, end))
}

/// One tensor: dtype, shape and its raw little-endian bytes.
struct Tensor<'a> {
    dtype: String,
    shape: Vec<usize>,
    raw: &'a [u8],
}

fn tensor<'a>(
    header: &HashMap<String, serde_json::Value>,
    bytes: &'a [u8],
    data_start: usize,
    key: &str,
) -> Result<Tensor<'a>> {
    let entry = header.get(key).with_context(|| format!("missing '{key}' key"))?;
    let dtype = entry["dtype"]
        .as_str()
        .with_context(|| format!("'{key}': missing dtype"))?
        .to_string();
    let shape = entry["shape"]
        .as_array()
        .with_context(|| format!("'{key}': missing shape"))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize))
        .collect::<Option<Vec<_>>>()
        .with_context(|| format!("'{key}': bad shape"))?;
    let offsets = entry["data_offsets"]
        .as_array()
        .with_context(|| format!("'{key}': missing data_offsets"))?;
    let s = offsets.first().and_then(|v| v.as_u64()).context("bad data_offsets")? as usize;
    let e = offsets.get(1).and_then(|v| v.as_u64()).context("bad data_offsets")? as usize;
    let raw = data_start
        .checked_add(s)
        .zip(data_start.checked_add(e))
        .and_then(|(s, e)| bytes.get(s..e))
        .with_context(|| format!("'{key}': data out of range"))?;
    Ok(Tensor { dtype, shape, raw })
}

impl Tensor<'_> {
    fn to_f64(&self) -> Result<Vec<f64>> {
        Ok(match self.dtype.as_str() {
            "F32" => self
                .raw
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
                .collect(),
            "F64" => self
                .raw
                .chunks_exact(8)
                .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
            other => bail!("expected float tensor, got {other}"),
        })
    }

    fn to_i64(&self) -> Result<Vec<i64>> {
        Ok(match self.dtype.as_str() {
            "I32" => self
                .raw
                .chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as i64)
                .collect(),
            "I64" => self
                .raw
                .chunks_exact(8)
                .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect(),
            other => bail!("expected integer tensor, got {other}"),
        })
    }
}

// ── Recording loader ──────────────────────────────────────────────────────

/// Load a recording from a safetensors file.
pub fn load_recording(path: impl AsRef<Path>) -> Result<Recording> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (header, data_start) = parse_header(&bytes)?;

    let data_t = tensor(&header, &bytes, data_start, "data")?;
    if data_t.shape.len() != 2 {
        bail!("'data' must be 2-D, got shape {:?}", data_t.shape);
    }
    let data = Array2::from_shape_vec((data_t.shape[0], data_t.shape[1]), data_t.to_f64()?)?;

    let sfreq = *tensor(&header, &bytes, data_start, "sfreq")?
        .to_f64()?
        .first()
        .context("'sfreq' is empty")?;

    let markers_t = tensor(&header, &bytes, data_start, "markers")?;
    if markers_t.shape.len() != 2 || markers_t.shape[1] != 2 {
        bail!("'markers' must have shape [N, 2], got {:?}", markers_t.shape);
    }
    let markers = markers_t
        .to_i64()?
        .chunks_exact(2)
        .map(|row| {
            let sample = usize::try_from(row[0]).context("negative marker sample")?;
            let id = u32::try_from(row[1]).context("marker id out of range")?;
            Ok(Marker::new(sample, MarkerCode::from_id(id)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Recording::new(data, sfreq, markers)?)
}

// ── Generic safetensors builder ───────────────────────────────────────────

/// Safetensors writer for F64, I64 and U8 tensors.
///
/// ```rust,no_run
/// use mep::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("signal", &[1.0, 2.0, 3.0], &[1, 3]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    #[cfg(test)]
    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_i64(&mut self, name: &str, data: &[i64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I64", shape.to_vec()));
    }

    /// Newline-joined UTF-8 strings stored as a U8 tensor.
    pub fn add_text(&mut self, name: &str, values: &[String]) {
        let bytes = values.join("\n").into_bytes();
        let len = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![len]));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": dtype,
                    "shape": shape,
                    "data_offsets": [offset, offset + data.len()],
                }),
            );
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes
            .into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Table writer ──────────────────────────────────────────────────────────

/// Write every export column of `table` to `path`.
pub fn write_table(table: &TrialTable, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    for (name, column) in table.export_columns() {
        match column {
            Column::Numeric(v) => w.add_f64(name, &v, &[v.len()]),
            Column::Text(v) => w.add_text(name, &v),
        }
    }
    w.add_i64("n_trials", &[table.len() as i64], &[1]);
    w.write(path)
}
