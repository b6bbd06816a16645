//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads settings
//! - wires the state store, estimator client and services together
//! - runs analysis jobs or answers queries
//! - prints reports and writes optional exports

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;

use crate::cli::{AnalyzeArgs, Cli, Command, ExportArgs, GlobalArgs, SimulateArgs};
use crate::config::Settings;
use crate::curves::{CurveService, QueryError, to_wire};
use crate::domain::Outcome;
use crate::error::AppError;
use crate::estimator::EstimatorClient;
use crate::pipeline::AnalysisPipeline;
use crate::store::{FileBackend, JobStore};

pub mod runner;

pub use runner::*;

/// Entry point for the `irt` binary.
pub fn run() -> Result<(), AppError> {
    crate::logging::init();
    let cli = Cli::parse();

    // Simulation needs no services.
    if let Command::Simulate(args) = &cli.command {
        return handle_simulate(args);
    }

    let settings = apply_overrides(Settings::from_env()?, &cli.global);
    let services = Services::build(&settings)?;

    match cli.command {
        Command::Analyze(args) => handle_analyze(&services, &args),
        Command::Status(args) => {
            let status = services.curves.get_status(&args.session)?;
            println!("{}", crate::report::format_status(&args.session, &status));
            Ok(())
        }
        Command::Results(args) => match services.curves.get_analysis(&args.session)? {
            Outcome::Ready(result) if args.json => print_json(&serde_json::to_value(&result).map_err(io_error)?),
            Outcome::Ready(result) => {
                println!("{}", crate::report::format_analysis_summary(&result));
                Ok(())
            }
            Outcome::Processing(status) => print_json(&to_wire(Ok(Outcome::Processing(status)))),
        },
        Command::Icc(args) => emit(
            services.curves.get_icc(&args.session, args.item.as_deref()),
            args.export.as_deref(),
        ),
        Command::Iif(args) => emit(services.curves.get_iif(&args.session), args.export.as_deref()),
        Command::Tif(args) => emit(services.curves.get_tif(&args.session), args.export.as_deref()),
        Command::Export(args) => handle_export(&services, &args),
        Command::Simulate(args) => handle_simulate(&args),
    }
}

/// Long-lived collaborators for one invocation.
///
/// The estimator client (and with it the degraded flag) lives exactly as
/// long as the process.
pub struct Services {
    pub store: Arc<JobStore>,
    pub estimator: Arc<EstimatorClient>,
    pub curves: CurveService,
    pub pipeline: Arc<AnalysisPipeline>,
}

impl Services {
    pub fn build(settings: &Settings) -> Result<Self, AppError> {
        let backend = FileBackend::open(&settings.state_dir)?;
        let store = Arc::new(JobStore::new(Arc::new(backend), settings.state_ttl));
        let estimator = Arc::new(EstimatorClient::new(
            settings.estimator_url.clone(),
            settings.timeouts,
            settings.degrade_after,
        )?);
        let curves = CurveService::new(Arc::clone(&store), estimator.clone());
        let pipeline = Arc::new(AnalysisPipeline::new(
            Arc::clone(&store),
            estimator.clone(),
            settings.data_dir.clone(),
        ));
        Ok(Self {
            store,
            estimator,
            curves,
            pipeline,
        })
    }
}

pub fn apply_overrides(mut settings: Settings, global: &GlobalArgs) -> Settings {
    if let Some(url) = &global.estimator_url {
        settings.estimator_url = url.clone();
    }
    if let Some(dir) = &global.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(dir) = &global.state_dir {
        settings.state_dir = dir.clone();
    }
    settings
}

fn handle_analyze(services: &Services, args: &AnalyzeArgs) -> Result<(), AppError> {
    let requests: Vec<JobRequest> = match (&args.session, args.files.as_slice()) {
        (Some(session), [file]) => vec![JobRequest::with_session(file, session.clone())],
        (Some(_), _) => {
            return Err(AppError::Usage("--session can only be used with a single file".to_string()));
        }
        (None, files) => files.iter().map(JobRequest::new).collect(),
    };

    let runner = JobRunner::new(Arc::clone(&services.pipeline), Arc::clone(&services.store), args.jobs)?;
    let reports = runner.run_batch(&requests);

    for report in &reports {
        println!("{}", crate::report::format_job_report(report));
        if report.succeeded() {
            if let Some(result) = services.store.get_result(&report.session_id) {
                println!("{}", crate::report::format_analysis_summary(&result));
            }
        }
    }

    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    if failed > 0 {
        return Err(AppError::JobsFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

fn handle_export(services: &Services, args: &ExportArgs) -> Result<(), AppError> {
    match services.curves.get_analysis(&args.session)? {
        Outcome::Ready(result) => {
            crate::io::write_item_parameters_csv(&args.csv, &result)?;
            println!(
                "Wrote {} item parameters to {}",
                result.item_parameters.len(),
                args.csv.display()
            );
            Ok(())
        }
        Outcome::Processing(status) => Err(AppError::Usage(format!(
            "Session {} has no results yet (status: {})",
            args.session, status.status
        ))),
    }
}

fn handle_simulate(args: &SimulateArgs) -> Result<(), AppError> {
    let data = crate::data::simulate_responses(args.items, args.students, args.seed)?;
    crate::data::write_responses_csv(&args.out, &data)?;
    println!(
        "Wrote {} students x {} items to {}",
        args.students,
        args.items,
        args.out.display()
    );
    Ok(())
}

/// Print a curve query reply and optionally save it.
fn emit(outcome: Result<Outcome<Value>, QueryError>, export: Option<&Path>) -> Result<(), AppError> {
    let outcome = outcome?;
    let payload = to_wire(Ok(outcome));
    if let Some(path) = export {
        crate::io::write_payload_json(path, &payload)?;
    }
    print_json(&payload)
}

fn print_json(value: &Value) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value).map_err(io_error)?;
    println!("{text}");
    Ok(())
}

fn io_error(e: serde_json::Error) -> AppError {
    AppError::Io(e.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn flags_override_settings() {
        let global = GlobalArgs {
            estimator_url: Some("http://10.0.0.2:8001".into()),
            data_dir: None,
            state_dir: Some(PathBuf::from("/var/lib/irt")),
        };
        let settings = apply_overrides(Settings::default(), &global);
        assert_eq!(settings.estimator_url, "http://10.0.0.2:8001");
        assert_eq!(settings.data_dir, Settings::default().data_dir);
        assert_eq!(settings.state_dir, PathBuf::from("/var/lib/irt"));
    }

    #[test]
    fn services_share_one_state_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            state_dir: dir.path().join("state"),
            data_dir: dir.path().join("data"),
            ..Settings::default()
        };
        let services = Services::build(&settings).unwrap();
        services
            .store
            .put_status("s1", crate::domain::JobStatus::Pending, "queued");

        let again = Services::build(&settings).unwrap();
        assert_eq!(again.curves.get_status("s1").unwrap().message, "queued");
        assert!(!services.estimator.is_degraded());
    }
}
