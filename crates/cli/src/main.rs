//! finit-wait - drive and observe finit inside a test target
//!
//! Wait subcommands exit 0 once the state is observed and 1 on timeout.
//! Dispatch subcommands print the target's output and exit with its exit code.

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use finit_harness_core::domain::{Condition, Runlevel};
use finit_harness_core::port::ExecutionResult;
use finit_harness_core::{FinitMachine, Step, StepOutcome, WaitOutcome};

use config::{HarnessConfig, TargetArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "finit-wait")]
#[command(about = "Drive and observe finit inside a test target", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for a finit condition (<domain>/<name>/<state>)
    Condition {
        condition: String,

        /// Timeout in seconds (default: --timeout-secs)
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Wait for "entering runlevel <level>" on the console
    Runlevel {
        /// 0-9 or S
        level: String,

        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Wait for service/<name>/running
    Service {
        name: String,

        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Wait for task/<name>/success
    Task {
        name: String,

        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Wait for net/<name>/up
    Interface {
        name: String,

        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// initctl start <service>
    Start { service: String },

    /// initctl stop <service>
    Stop { service: String },

    /// initctl reload <service>
    Reload { service: String },

    /// initctl status <service>
    Status { service: String },

    /// Run an arbitrary initctl subcommand
    Initctl {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },

    /// Run a JSON scenario file (array of steps)
    Run { scenario: PathBuf },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init_logging(cli.target.log_format)?;
    info!("finit-wait v{} starting...", VERSION);

    let config = HarnessConfig::from_args(&cli.target)?;
    info!(
        transport = ?config.transport,
        console_log = ?config.console_log,
        default_timeout_s = config.default_timeout.as_secs(),
        "Configuration loaded"
    );

    let machine = config.build_machine();
    let timeout = |secs: Option<u64>| secs.map(Duration::from_secs).unwrap_or(config.default_timeout);

    match cli.command {
        Commands::Condition { condition, timeout: t } => {
            let condition: Condition = condition.parse()?;
            let outcome = machine.wait_for_condition(&condition, timeout(t)).await?;
            report_wait(&format!("condition '{condition}'"), &outcome);
        }

        Commands::Runlevel { level, timeout: t } => {
            let level: Runlevel = level.parse()?;
            let outcome = machine.wait_for_runlevel(level, timeout(t)).await?;
            report_wait(&format!("runlevel {level}"), &outcome);
        }

        Commands::Service { name, timeout: t } => {
            let outcome = machine.wait_for_service(&name, timeout(t)).await?;
            report_wait(&format!("service '{name}' running"), &outcome);
        }

        Commands::Task { name, timeout: t } => {
            let outcome = machine.wait_for_task(&name, timeout(t)).await?;
            report_wait(&format!("task '{name}' succeeded"), &outcome);
        }

        Commands::Interface { name, timeout: t } => {
            let outcome = machine.wait_for_interface(&name, timeout(t)).await?;
            report_wait(&format!("interface '{name}' up"), &outcome);
        }

        Commands::Start { service } => return Ok(passthrough(machine.start_service(&service).await?)),
        Commands::Stop { service } => return Ok(passthrough(machine.stop_service(&service).await?)),
        Commands::Reload { service } => {
            return Ok(passthrough(machine.reload_service(&service).await?))
        }
        Commands::Status { service } => {
            return Ok(passthrough(machine.get_service_status(&service).await?))
        }
        Commands::Initctl { args } => return Ok(passthrough(machine.initctl(&args.join(" ")).await?)),

        Commands::Run { scenario } => run_scenario(&machine, &scenario).await?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_scenario(machine: &FinitMachine, path: &Path) -> Result<()> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    let steps = Step::parse_list(&json)
        .with_context(|| format!("Invalid scenario {}", path.display()))?;

    println!(
        "{}",
        format!("Running {} step(s) from {}", steps.len(), path.display())
            .cyan()
            .bold()
    );

    let outcomes = machine.run_scenario(&steps).await?;

    for (step, outcome) in steps.iter().zip(&outcomes) {
        match outcome {
            StepOutcome::Waited(wait) => {
                println!(
                    "  {} {} ({} attempt(s), {:.1}s)",
                    "✓".green(),
                    step.op(),
                    wait.attempts,
                    wait.elapsed.as_secs_f64()
                );
            }
            StepOutcome::Executed(result) => {
                let code = result.exit_code().to_string();
                let code = if result.succeeded() {
                    code.green()
                } else {
                    code.yellow()
                };
                println!("  {} {} (exit {})", "•".bold(), step.op(), code);
            }
        }
    }

    Ok(())
}

fn report_wait(what: &str, outcome: &WaitOutcome) {
    println!(
        "{} {} after {} attempt(s), {:.1}s",
        "✓".green().bold(),
        what,
        outcome.attempts,
        outcome.elapsed.as_secs_f64()
    );
}

/// Print the target's output unchanged and mirror its exit code
fn passthrough(result: ExecutionResult) -> ExitCode {
    let (exit_code, output) = result.into_parts();
    print!("{output}");
    ExitCode::from(u8::try_from(exit_code).unwrap_or(1))
}
