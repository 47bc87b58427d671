use hplc_peaks::{
    PeakPipeline,
    ProcessingGuard,
    ProcessingRegistry,
};
use indicatif::{
    ParallelProgressIterator,
    ProgressStyle,
};
use rayon::prelude::*;
use std::path::{
    Path,
    PathBuf,
};
use std::time::Instant;
use tracing::{
    error,
    info,
    instrument,
};

use crate::cli::SerializationFormat;
use crate::error::CliError;
use crate::io::{
    read_measurement,
    write_json_atomic,
};

/// What a batch run computes for every measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Peaks,
    Baseline,
}

impl BatchKind {
    fn suffix(&self) -> &'static str {
        match self {
            BatchKind::Peaks => "peaks",
            BatchKind::Baseline => "baseline",
        }
    }
}

#[derive(Debug)]
pub struct BatchSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, CliError)>,
}

pub fn output_file(output_dir: &Path, id: &str, kind: BatchKind) -> PathBuf {
    output_dir.join(format!("{}.{}.json", id, kind.suffix()))
}

/// Runs the pipeline over every input in parallel.
///
/// A measurement that fails to read or process is reported in the summary
/// and does not stop the others. Each measurement is flagged in `registry`
/// from the moment its data is read until its result has been renamed into
/// place, so two inputs with the same id never race on one output file.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn process_batch(
    inputs: &[PathBuf],
    pipeline: &PeakPipeline,
    registry: &ProcessingRegistry,
    kind: BatchKind,
    output_dir: &Path,
    format: SerializationFormat,
) -> Result<BatchSummary, CliError> {
    std::fs::create_dir_all(output_dir)?;
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .map_err(|e| CliError::DataProcessing(format!("Invalid progress bar template: {}", e)))?;

    let start = Instant::now();
    let results: Vec<(PathBuf, Result<PathBuf, CliError>)> = inputs
        .par_iter()
        .progress_with_style(style)
        .map(|path| {
            let res = process_one(path, pipeline, registry, kind, output_dir, format);
            (path.clone(), res)
        })
        .collect();

    let mut summary = BatchSummary {
        written: Vec::with_capacity(results.len()),
        failed: Vec::new(),
    };
    for (path, res) in results {
        match res {
            Ok(out) => summary.written.push(out),
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                summary.failed.push((path, e));
            }
        }
    }
    info!(
        "Processed {} measurements ({} failed) in {:?}",
        inputs.len(),
        summary.failed.len(),
        start.elapsed()
    );
    Ok(summary)
}

fn process_one(
    path: &Path,
    pipeline: &PeakPipeline,
    registry: &ProcessingRegistry,
    kind: BatchKind,
    output_dir: &Path,
    format: SerializationFormat,
) -> Result<PathBuf, CliError> {
    let measurement = read_measurement(path)?;
    let handle = registry.handle(measurement.id.as_str());
    let _guard = ProcessingGuard::enter(&handle)?;

    let out_path = output_file(output_dir, &measurement.id, kind);
    match kind {
        BatchKind::Peaks => {
            let output = pipeline.process(&measurement.series)?;
            write_json_atomic(&output, &out_path, format)?;
        }
        BatchKind::Baseline => {
            let baseline = pipeline.process_baseline_only(&measurement.series)?;
            write_json_atomic(&baseline, &out_path, format)?;
        }
    }
    Ok(out_path)
}
