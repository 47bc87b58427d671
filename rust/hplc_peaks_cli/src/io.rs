//! Reading measurements and writing results.

use hplc_peaks::{
    MeasurementId,
    PipelineError,
    Series,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::io::{
    BufReader,
    BufWriter,
    Write,
};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::cli::SerializationFormat;
use crate::error::CliError;

/// Evenly sampled detector trace as it is exchanged on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementInput {
    pub id: MeasurementId,
    /// Milliseconds between samples.
    pub period_ms: f64,
    /// Absorbance in mAU.
    pub samples: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: f64,
    value: f64,
}

#[derive(Debug, Clone)]
pub struct Measurement {
    pub id: MeasurementId,
    pub series: Series,
}

impl TryFrom<MeasurementInput> for Measurement {
    type Error = CliError;

    fn try_from(input: MeasurementInput) -> Result<Self, Self::Error> {
        check_id(&input.id)?;
        let series =
            Series::from_samples(&input.samples, input.period_ms).map_err(PipelineError::from)?;
        Ok(Self {
            id: input.id,
            series,
        })
    }
}

// Ids end up in output file names.
fn check_id(id: &str) -> Result<(), CliError> {
    if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(CliError::DataReading(format!(
            "Measurement id {:?} cannot be used as a file name",
            id
        )));
    }
    Ok(())
}

/// Reads a measurement, dispatching on the file extension.
///
/// Json files carry their own id, csv files (`time,value` with time in
/// minutes) are named after the file stem.
pub fn read_measurement(path: &Path) -> Result<Measurement, CliError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let measurement = match extension.as_deref() {
        Some("json") => read_json_measurement(path)?,
        Some("csv") => read_csv_measurement(path)?,
        _ => {
            return Err(CliError::DataReading(format!(
                "Unsupported measurement file {}, expected .json or .csv",
                path.display()
            )));
        }
    };
    debug!(
        "Read measurement {} ({} samples) from {}",
        measurement.id,
        measurement.series.len(),
        path.display()
    );
    Ok(measurement)
}

fn read_json_measurement(path: &Path) -> Result<Measurement, CliError> {
    let file = std::fs::File::open(path)?;
    let input: MeasurementInput = serde_json::from_reader(BufReader::new(file))?;
    input.try_into()
}

fn read_csv_measurement(path: &Path) -> Result<Measurement, CliError> {
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CliError::DataReading("Invalid path encoding".to_string()))?
        .to_string();
    check_id(&id)?;

    let mut reader = csv::Reader::from_path(path)?;
    let mut times = Vec::new();
    let mut values = Vec::new();
    for row in reader.deserialize() {
        let row: CsvRow = row?;
        times.push(row.time);
        values.push(row.value);
    }
    let series = Series::try_new(times, values).map_err(PipelineError::from)?;
    Ok(Measurement { id, series })
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn write_json<T: Serialize, W: Write>(
    mut writer: W,
    value: &T,
    format: SerializationFormat,
) -> Result<(), CliError> {
    match format {
        SerializationFormat::Json => serde_json::to_writer(&mut writer, value)?,
        SerializationFormat::PrettyJson => serde_json::to_writer_pretty(&mut writer, value)?,
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes `value` next to `path` and renames it into place, so readers see
/// either the previous result or the new one.
pub fn write_json_atomic<T: Serialize>(
    value: &T,
    path: &Path,
    format: SerializationFormat,
) -> Result<(), CliError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    write_json(BufWriter::new(&mut tmp), value, format)?;
    tmp.persist(path)?;
    Ok(())
}

/// Writes to `path` atomically, or to stdout when there is no path.
pub fn emit_json<T: Serialize>(
    value: &T,
    path: Option<&Path>,
    format: SerializationFormat,
) -> Result<(), CliError> {
    match path {
        Some(path) => {
            write_json_atomic(value, path, format)?;
            println!("Wrote to {}", path.display());
            Ok(())
        }
        None => write_json(std::io::stdout().lock(), value, format),
    }
}
