//! shoot-operations - end-to-end scenarios for Gardener shoot operations.
//!
//! This is the main entry point that:
//! - Parses the command line (flags fall back to the environment)
//! - Initializes structured logging
//! - Connects to the garden cluster and runs the selected scenarios
//! - Prints the run report and exits non-zero if a scenario failed

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use shoot_operations::{FrameworkConfig, Scenario, Selection, ShootFramework, run_scenarios};

/// Run lifecycle operation scenarios against a Gardener shoot
#[derive(Parser, Debug)]
#[command(name = "shoot-operations", version, about, long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the selected scenarios against the shoot
    Run(RunArgs),

    /// List the selected scenarios with their labels and timeouts
    List(SelectionArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    framework: FrameworkConfig,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Write the run report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SelectionArgs {
    /// Run only this scenario (repeatable)
    #[arg(long = "scenario", value_enum)]
    scenarios: Vec<Scenario>,

    /// Run only scenarios carrying this label (repeatable)
    #[arg(long = "label")]
    labels: Vec<String>,
}

impl From<SelectionArgs> for Selection {
    fn from(args: SelectionArgs) -> Self {
        Selection {
            names: args.scenarios,
            labels: args.labels,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("shoot_operations=info,kube=warn"),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer()).try_init()?,
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Commands::List(selection) => {
            for scenario in Selection::from(selection).scenarios() {
                println!(
                    "{:<20} {:<18} {:>5}m  {}",
                    scenario.name(),
                    scenario.labels().join(","),
                    scenario.timeout().as_secs() / 60,
                    scenario.description()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let scenarios = Selection::from(args.selection).scenarios();
    if scenarios.is_empty() {
        error!("No scenario matches the selection");
        return Ok(ExitCode::FAILURE);
    }

    info!(
        shoot = %args.framework.shoot_name,
        namespace = %args.framework.project_namespace,
        scenarios = ?scenarios.iter().map(|s| s.name()).collect::<Vec<_>>(),
        "Starting shoot-operations"
    );

    let mut framework = ShootFramework::connect(args.framework).await?;
    let report = run_scenarios(&mut framework, &scenarios).await;

    println!("{}", report);
    if let Some(path) = args.report {
        report.write_json(&path)?;
        info!(path = %path.display(), "Wrote run report");
    }

    if report.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
