use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Use library instead of local modules
use attendance_reconciliation::{
    render_summary, run, write_outputs, DuplicatePolicy, InputPaths, OutputFiles,
    ReconcileConfig, RunManifest,
};

/// Consolidated attendance from roster, form responses and meeting log
#[derive(Parser, Debug)]
#[command(name = "attendance-reconciliation")]
#[command(version)]
struct Args {
    /// Official roster CSV (last names, first names)
    #[arg(long, env = "ATTENDANCE_ROSTER")]
    roster: PathBuf,

    /// Form responses CSV
    #[arg(long, env = "ATTENDANCE_FORM")]
    form: PathBuf,

    /// Meeting participants CSV
    #[arg(long, env = "ATTENDANCE_MEETING")]
    meeting: PathBuf,

    /// Minimum meeting hours for attendance (overrides the config file)
    #[arg(long, env = "ATTENDANCE_MIN_HOURS")]
    min_hours: Option<f64>,

    /// Directory for the output files
    #[arg(short, long, env = "ATTENDANCE_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// JSON config file (thresholds, column hints, duplicate policy)
    #[arg(long, env = "ATTENDANCE_CONFIG")]
    config: Option<PathBuf>,

    /// Fail when two rows of a source normalize to the same name
    #[arg(long)]
    strict_duplicates: bool,

    /// Skip the JSON run manifest
    #[arg(long)]
    no_manifest: bool,
}

impl Args {
    fn reconcile_config(&self) -> Result<ReconcileConfig> {
        let mut config = match &self.config {
            Some(path) => ReconcileConfig::from_file(path)?,
            None => ReconcileConfig::default(),
        };

        if let Some(min_hours) = self.min_hours {
            config = config.with_min_hours(min_hours);
        }
        if self.strict_duplicates {
            config = config.with_duplicate_policy(DuplicatePolicy::Strict);
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attendance_reconciliation=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.reconcile_config()?;
    let paths = InputPaths {
        roster: args.roster.clone(),
        form: args.form.clone(),
        meeting: args.meeting.clone(),
    };

    info!(
        min_hours = config.min_hours,
        policy = config.duplicate_policy.as_str(),
        "starting attendance reconciliation"
    );

    let outcome = run(&paths, &config)?;

    let files = OutputFiles::stamped(&args.output, Local::now(), !args.no_manifest);
    let manifest = if args.no_manifest {
        None
    } else {
        Some(RunManifest::new(&config, paths.digests()?, &outcome.report, &outcome.students))
    };

    write_outputs(&files, &outcome.students, manifest.as_ref())?;

    println!("{}", render_summary(&outcome.report, Some(&files)));

    Ok(())
}
