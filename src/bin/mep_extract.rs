use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use mep::{
    io::{load_recording, write_table},
    process_recording,
    summary::{pulse_comparison, success_rate, success_rate_by_block},
    ExclusionMethod, PipelineConfig,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Exclusion {
    Rms,
    Outliers,
}

#[derive(Parser, Debug)]
#[command(name = "mep_extract", about = "MEP extraction, exclusion and normalisation for one recording")]
struct Args {
    /// recording.safetensors (data [C, T], sfreq [1], markers [N, 2])
    #[arg(long)]
    input: PathBuf,

    /// Trial table output path (safetensors)
    #[arg(long)]
    output: PathBuf,

    /// JSON file with a PipelineConfig; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Participant number written to ID_info
    #[arg(long)]
    participant: Option<u32>,

    /// Exclusion rule (overrides the config file)
    #[arg(long, value_enum)]
    exclusion: Option<Exclusion>,

    /// RMS threshold multiplier k (overrides the config file)
    #[arg(long)]
    rms_k: Option<f64>,

    /// Stimulus sample to discard; may be repeated
    #[arg(long = "spurious-trigger")]
    spurious_triggers: Vec<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            serde_json::from_str::<PipelineConfig>(&text).with_context(|| format!("parsing {}", p.display()))?
        }
        None => PipelineConfig::default(),
    };
    if let Some(id) = args.participant {
        cfg.participant = id;
    }
    if let Some(e) = args.exclusion {
        cfg.exclusion = match e {
            Exclusion::Rms => ExclusionMethod::Rms,
            Exclusion::Outliers => ExclusionMethod::Outliers,
        };
    }
    if let Some(k) = args.rms_k {
        cfg.rms_k = k;
    }
    cfg.spurious_triggers.extend(&args.spurious_triggers);

    let rec = load_recording(&args.input)?;
    info!(
        channels = rec.data.nrows(),
        samples = rec.n_samples(),
        sfreq = rec.sfreq,
        markers = rec.markers.len(),
        "loaded {}",
        args.input.display()
    );

    let table = process_recording(&rec, &cfg)
        .with_context(|| format!("processing {}", args.input.display()))?;

    let outcomes = table.outcomes();
    if let Some(rate) = success_rate(&outcomes) {
        info!(rate = rate.rate, n = rate.n, "global success rate");
    }
    let by_block = success_rate_by_block(&table.blocks(), &outcomes)?;
    let cmp = pulse_comparison(&by_block);
    info!(no_pulse = ?cmp.no_pulse, pulse = ?cmp.pulse, "success rate by condition");
    for (column, n) in table.missing_counts().into_iter().filter(|(_, n)| *n > 0) {
        info!(column, missing = n, "missing values");
    }

    write_table(&table, &args.output)?;
    info!("written {} trials → {}", table.len(), args.output.display());
    Ok(())
}
