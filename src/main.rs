//! pt-timer - run a plan of deferred and repeating tasks.
//!
//! Usage:
//!   pt-timer run [PLAN]         Run a plan (or the built-in demo) for a while
//!   pt-timer validate <PLAN>    Validate a plan without running it

use clap::{Parser, Subcommand};
use petit_timer::{PlanConfig, Timer, Token, YamlLoader};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// How long to wait for the loop thread to report a run-state change.
const STATE_WAIT: Duration = Duration::from_secs(5);

/// pt-timer - deferred and repeating task timer
#[derive(Parser)]
#[command(name = "pt-timer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule every task of a plan and let the timer run
    Run {
        /// Path to a YAML plan (default: built-in demo plan)
        #[arg(value_name = "PLAN")]
        plan: Option<PathBuf>,

        /// Seconds to keep the timer running before stopping it
        #[arg(short = 'd', long, default_value = "6")]
        duration_secs: u64,
    },

    /// Validate a plan without running it
    Validate {
        /// Path to a YAML plan
        #[arg(value_name = "PLAN")]
        plan: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_thread_names(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            plan,
            duration_secs,
        } => {
            run_plan(plan, duration_secs)?;
        }
        Commands::Validate { plan } => {
            validate_plan(plan)?;
        }
    }

    Ok(())
}

/// Run a plan until `duration_secs` elapsed, then stop the timer.
fn run_plan(path: Option<PathBuf>, duration_secs: u64) -> Result<(), Box<dyn std::error::Error>> {
    let plan = match &path {
        Some(path) => {
            info!("Loading plan from: {}", path.display());
            YamlLoader::load_plan(path)?
        }
        None => {
            info!("No plan given, running the built-in demo");
            PlanConfig::demo()
        }
    };

    let (handle, timer_thread) = Timer::with_config(plan.timer.clone()).spawn()?;
    if !handle.wait_until_running(STATE_WAIT) {
        warn!("Timer thread did not report running in time");
    }

    let tokens: Vec<Token> = plan
        .tasks
        .iter()
        .map(|task| {
            let name = task.name.clone();
            let mut fired: u64 = 0;
            handle.schedule_repeating(task.delay(), task.interval(), move || {
                fired += 1;
                info!(task = %name, fired, "Task fired");
            })
        })
        .collect();

    info!(
        tasks = tokens.len(),
        pending = handle.task_count(),
        "Plan scheduled, running for {}s",
        duration_secs
    );

    for second in 0..duration_secs {
        info!(second, pending = handle.task_count(), "Tick");
        thread::sleep(Duration::from_secs(1));
    }

    handle.request_stop();
    if !handle.wait_until_stopped(STATE_WAIT) {
        warn!("Timer thread did not report stopping in time");
    }

    let abandoned = handle.task_count();
    drop(tokens);

    timer_thread.join().map_err(|_| {
        error!("Timer thread panicked");
        "timer thread panicked"
    })?;

    info!(abandoned, "Timer stopped");
    Ok(())
}

/// Validate a plan and list its tasks.
fn validate_plan(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    info!("Validating plan: {}", path.display());

    let plan = match YamlLoader::load_plan(&path) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Validation failed: {}", e);
            return Err(e.into());
        }
    };

    println!("Timer thread: {}", plan.timer.thread_name);
    if plan.tasks.is_empty() {
        println!("No tasks in {}", path.display());
        return Ok(());
    }

    println!("Tasks in {}:", path.display());
    for task in &plan.tasks {
        match task.every_ms {
            Some(every) => println!("  - {}: after {}ms, every {}ms", task.name, task.delay_ms, every),
            None => println!("  - {}: after {}ms, once", task.name, task.delay_ms),
        }
    }

    Ok(())
}
