//! Command-line parsing for the IRT analysis tool.
//!
//! Argument parsing stays here; dispatch lives in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "irt", version, about = "IRT analysis jobs with local curve fallback")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for environment settings.
#[derive(Debug, Args, Clone, Default)]
pub struct GlobalArgs {
    /// Base URL of the estimation service (overrides IRT_ESTIMATOR_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub estimator_url: Option<String>,

    /// Directory for cleaned response matrices (overrides IRT_DATA_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory of the job state store (overrides IRT_STATE_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run an analysis job for each uploaded response matrix.
    Analyze(AnalyzeArgs),
    /// Show the status record of a session.
    Status(SessionArgs),
    /// Print the stored analysis result of a session.
    Results(ResultsArgs),
    /// Item characteristic curves.
    Icc(IccArgs),
    /// Item information functions.
    Iif(CurveArgs),
    /// Test information function and standard error of measurement.
    Tif(CurveArgs),
    /// Export the item parameter table of a session.
    Export(ExportArgs),
    /// Generate a synthetic 3PL response matrix.
    Simulate(SimulateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Response matrix CSV files (one job each).
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Session id to use (single file only; default: a new UUID).
    #[arg(long)]
    pub session: Option<String>,

    /// Worker threads for concurrent jobs (0 = one per core).
    #[arg(long, default_value_t = 0)]
    pub jobs: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SessionArgs {
    pub session: String,
}

#[derive(Debug, Args, Clone)]
pub struct ResultsArgs {
    pub session: String,

    /// Print the raw JSON record instead of the summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct IccArgs {
    pub session: String,

    /// Restrict to one item.
    #[arg(long)]
    pub item: Option<String>,

    /// Also write the payload to this JSON file.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CurveArgs {
    pub session: String,

    /// Also write the payload to this JSON file.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    pub session: String,

    /// Destination CSV for the item parameter table.
    #[arg(long, value_name = "PATH")]
    pub csv: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Number of items.
    #[arg(long, default_value_t = 10)]
    pub items: usize,

    /// Number of students.
    #[arg(long, default_value_t = 500)]
    pub students: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV path.
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from(["irt", "icc", "abc", "--item", "Q1", "--data-dir", "/tmp/d"]).unwrap();
        assert_eq!(cli.global.data_dir, Some(PathBuf::from("/tmp/d")));
        match cli.command {
            Command::Icc(args) => {
                assert_eq!(args.session, "abc");
                assert_eq!(args.item.as_deref(), Some("Q1"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn analyze_requires_a_file() {
        assert!(Cli::try_parse_from(["irt", "analyze"]).is_err());
        let cli = Cli::try_parse_from(["irt", "analyze", "a.csv", "b.csv"]).unwrap();
        match cli.command {
            Command::Analyze(args) => assert_eq!(args.files.len(), 2),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
