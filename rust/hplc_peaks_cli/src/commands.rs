use hplc_peaks::{
    ControlPoint,
    PeakBound,
    PeakPipeline,
    PipelineConfig,
    ProcessingRegistry,
};
use std::path::Path;
use tracing::{
    info,
    instrument,
};

use crate::cli::{
    BatchArgs,
    GlobalArgs,
    ManualBaselineArgs,
    RecomputePeakArgs,
    WriteTemplateArgs,
};
use crate::error::CliError;
use crate::io::{
    emit_json,
    read_json,
    read_measurement,
};
use crate::processing::{
    process_batch,
    BatchKind,
};

/// Builds the pipeline from `--config`, or the defaults without one.
pub fn load_pipeline(config_path: Option<&Path>) -> Result<PeakPipeline, CliError> {
    let config = match config_path {
        Some(path) => {
            let config: PipelineConfig = read_json(path)?;
            info!("Using pipeline configuration: {:#?}", config);
            config
        }
        None => PipelineConfig::default(),
    };
    Ok(PeakPipeline::new(config)?)
}

fn main_batch(args: BatchArgs, global: &GlobalArgs, kind: BatchKind) -> Result<(), CliError> {
    let pipeline = load_pipeline(global.config.as_deref())?;
    let registry = ProcessingRegistry::new();
    let summary = process_batch(
        &args.inputs,
        &pipeline,
        &registry,
        kind,
        &args.output_path,
        global.format,
    )?;

    println!(
        "Wrote {} results to {}",
        summary.written.len(),
        args.output_path.display()
    );
    if !summary.failed.is_empty() {
        return Err(CliError::DataProcessing(format!(
            "{} of {} measurements failed",
            summary.failed.len(),
            args.inputs.len()
        )));
    }
    Ok(())
}

/// Main function for the 'process' subcommand.
#[instrument(skip(global))]
pub fn main_process(args: BatchArgs, global: &GlobalArgs) -> Result<(), CliError> {
    main_batch(args, global, BatchKind::Peaks)
}

/// Main function for the 'baseline' subcommand.
#[instrument(skip(global))]
pub fn main_baseline(args: BatchArgs, global: &GlobalArgs) -> Result<(), CliError> {
    main_batch(args, global, BatchKind::Baseline)
}

fn bound(time: f64, value: Option<f64>) -> PeakBound {
    match value {
        Some(v) => PeakBound::anchored(time, v),
        None => PeakBound::at(time),
    }
}

/// Main function for the 'recompute-peak' subcommand.
#[instrument(skip(global))]
pub fn main_recompute_peak(args: RecomputePeakArgs, global: &GlobalArgs) -> Result<(), CliError> {
    let pipeline = load_pipeline(global.config.as_deref())?;
    let measurement = read_measurement(&args.measurement_path)?;
    let peak = pipeline.recompute_peak(
        &measurement.series,
        bound(args.start, args.start_value),
        bound(args.end, args.end_value),
    )?;
    info!(
        "Recomputed peak of {} at {:.4} min, area {:?}",
        measurement.id, peak.apex, peak.area
    );
    emit_json(&peak, args.output_path.as_deref(), global.format)
}

/// Main function for the 'manual-baseline' subcommand.
#[instrument(skip(global))]
pub fn main_manual_baseline(
    args: ManualBaselineArgs,
    global: &GlobalArgs,
) -> Result<(), CliError> {
    let pipeline = load_pipeline(global.config.as_deref())?;
    let measurement = read_measurement(&args.measurement_path)?;
    let points: Vec<ControlPoint> = read_json(&args.control_points_path)?;
    info!(
        "Drawing baseline of {} through {} control points",
        measurement.id,
        points.len()
    );
    let baseline = pipeline.apply_manual_baseline(&measurement.series, &points)?;
    emit_json(&baseline, args.output_path.as_deref(), global.format)
}

const MEASUREMENT_TEMPLATE: &str = r#"{
  "id": "example-measurement",
  "period_ms": 1000.0,
  "samples": [
    2.0, 2.0, 2.1, 2.0, 2.2, 3.5, 8.9, 21.4, 38.7, 50.1,
    38.6, 21.5, 9.0, 3.6, 2.3, 2.1, 2.0, 2.0, 2.1, 2.0
  ]
}"#;

const CONTROL_POINTS_TEMPLATE: &str = r#"[
  { "time": 0.0, "value": 2.0 },
  { "time": 0.15, "value": 2.1 },
  { "time": 0.3, "value": 2.0 }
]"#;

/// Main function for the 'write-template' subcommand.
pub fn main_write_template(args: WriteTemplateArgs) -> Result<(), CliError> {
    let target_dir = args.output_path;
    std::fs::create_dir_all(&target_dir)?;

    let config_path = target_dir.join("pipeline_config_template.json");
    std::fs::write(
        &config_path,
        serde_json::to_string_pretty(&PipelineConfig::default())?,
    )?;
    println!("Wrote pipeline config template to: {}", config_path.display());

    let measurement_path = target_dir.join("measurement_template.json");
    let control_points_path = target_dir.join("control_points_template.json");
    std::fs::write(&measurement_path, MEASUREMENT_TEMPLATE)?;
    std::fs::write(&control_points_path, CONTROL_POINTS_TEMPLATE)?;
    println!(
        "Wrote input templates to:\n- {}\n- {}",
        measurement_path.display(),
        control_points_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SerializationFormat;
    use crate::io::MeasurementInput;
    use hplc_peaks::{
        BaselineConfig,
        Peak,
        PipelineError,
        Series,
    };

    #[test]
    fn test_templates_deserializable() {
        let dir = tempfile::tempdir().unwrap();
        main_write_template(WriteTemplateArgs {
            output_path: dir.path().to_path_buf(),
        })
        .unwrap();

        let config: PipelineConfig =
            read_json(&dir.path().join("pipeline_config_template.json")).unwrap();
        assert_eq!(config, PipelineConfig::default());

        let measurement = read_measurement(&dir.path().join("measurement_template.json")).unwrap();
        assert_eq!(measurement.series.len(), 20);

        let points: Vec<ControlPoint> =
            serde_json::from_str(CONTROL_POINTS_TEMPLATE).unwrap();
        let baseline = PeakPipeline::default()
            .apply_manual_baseline(&measurement.series, &points)
            .unwrap();
        assert_eq!(baseline.len(), 20);
    }

    #[test]
    fn test_measurement_template_matches_input_type() {
        let input: MeasurementInput = serde_json::from_str(MEASUREMENT_TEMPLATE).unwrap();
        assert_eq!(input.samples.len(), 20);
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "fit": { "max_iterations": 50 } }"#).unwrap();
        let pipeline = load_pipeline(Some(&path)).unwrap();
        assert_eq!(pipeline.config().fit.max_iterations, 50);
        assert_eq!(pipeline.config().baseline, BaselineConfig::default());

        std::fs::write(&path, r#"{ "baseline": { "iterations": 0 } }"#).unwrap();
        assert!(matches!(
            load_pipeline(Some(&path)),
            Err(CliError::Pipeline(PipelineError::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn test_recompute_and_manual_baseline_commands() {
        let dir = tempfile::tempdir().unwrap();
        let measurement_path = dir.path().join("m.json");
        std::fs::write(&measurement_path, MEASUREMENT_TEMPLATE).unwrap();
        let global = GlobalArgs {
            config: None,
            format: SerializationFormat::Json,
        };

        // Samples are one second apart, the bump tops out at sample 9.
        let peak_path = dir.path().join("peak.json");
        main_recompute_peak(
            RecomputePeakArgs {
                measurement_path: measurement_path.clone(),
                start: 4.0 / 60.0,
                end: 14.0 / 60.0,
                start_value: Some(2.0),
                end_value: Some(2.0),
                output_path: Some(peak_path.clone()),
            },
            &global,
        )
        .unwrap();
        let peak: Peak = read_json(&peak_path).unwrap();
        assert!((peak.apex - 9.0 / 60.0).abs() < 1e-12);
        assert!(peak.is_manual());
        assert!(peak.area.unwrap() > 0.0);

        let points_path = dir.path().join("points.json");
        std::fs::write(&points_path, CONTROL_POINTS_TEMPLATE).unwrap();
        let baseline_path = dir.path().join("baseline.json");
        main_manual_baseline(
            ManualBaselineArgs {
                measurement_path,
                control_points_path: points_path,
                output_path: Some(baseline_path.clone()),
            },
            &global,
        )
        .unwrap();
        let baseline: Series = read_json(&baseline_path).unwrap();
        assert_eq!(baseline.len(), 20);
    }
}
