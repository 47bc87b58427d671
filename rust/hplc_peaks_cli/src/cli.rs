use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Json file with the pipeline configuration, defaults are used when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The format to use for the output
    #[arg(long, global = true, default_value_t, value_enum)]
    pub format: SerializationFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract peaks from one or more measurements.
    Process(BatchArgs),
    /// Estimate only the baseline of one or more measurements.
    Baseline(BatchArgs),
    /// Rebuild a single peak from hand-drawn bounds.
    RecomputePeak(RecomputePeakArgs),
    /// Replace the baseline of a measurement with hand-placed control points.
    ManualBaseline(ManualBaselineArgs),
    /// Write template configuration files.
    WriteTemplate(WriteTemplateArgs),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum SerializationFormat {
    Json,
    #[default]
    PrettyJson,
}

#[derive(Parser, Debug, Clone)]
pub struct BatchArgs {
    /// Measurement files, json (`id`, `period_ms`, `samples`) or csv (`time,value`).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// The directory results are written to.
    #[arg(short, long)]
    pub output_path: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct RecomputePeakArgs {
    /// The measurement the peak belongs to.
    #[arg(short, long)]
    pub measurement_path: PathBuf,

    /// Peak start, in minutes.
    #[arg(long, allow_negative_numbers = true)]
    pub start: f64,

    /// Peak end, in minutes.
    #[arg(long, allow_negative_numbers = true)]
    pub end: f64,

    /// Signal value the chord starts at. Needs `--end-value` as well.
    #[arg(long, allow_negative_numbers = true)]
    pub start_value: Option<f64>,

    /// Signal value the chord ends at.
    #[arg(long, allow_negative_numbers = true)]
    pub end_value: Option<f64>,

    /// Output file, stdout when omitted.
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ManualBaselineArgs {
    /// The measurement to redraw the baseline of.
    #[arg(short, long)]
    pub measurement_path: PathBuf,

    /// Json list of `{ "time": .., "value": .. }` control points.
    #[arg(short, long)]
    pub control_points_path: PathBuf,

    /// Output file, stdout when omitted.
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The path to the output files.
    #[arg(short, long)]
    pub output_path: PathBuf,
}
