//! indexport CLI
//!
//! Moves records and settings into, out of and between Algolia indices.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::Parser;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use indexport::cli::{usage, Cli};
use indexport::config::Profile;
use indexport::pipeline::{execute, Interrupt};
use indexport::Error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version are printed to stdout and are not failures
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {e:#}");
        return ExitCode::from(1);
    }

    let interrupt = Interrupt::new();
    spawn_interrupt_handler(interrupt.clone());

    let name = cli.command.name();
    let example = cli.command.example();

    match run(cli, &interrupt).await {
        Ok(()) if interrupt.is_triggered() => {
            eprintln!("Cancelled");
            ExitCode::from(2)
        }
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e, name, example);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli, interrupt: &Interrupt) -> indexport::Result<()> {
    let profile = match &cli.config {
        Some(path) => Profile::from_file(path)?,
        None => Profile::default(),
    };
    let job = cli.command.into_job(&profile)?;
    execute(job, &profile.options, interrupt).await
}

fn report(error: &Error, command: &str, example: &str) {
    match error {
        Error::Interrupted => eprintln!("Cancelled"),
        e if e.is_usage() => {
            eprintln!("Error: {e}\n");
            eprintln!("{}", usage(command));
            eprintln!("Example: $ {example}");
        }
        e => eprintln!("Error: {e}"),
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("indexport=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// First Ctrl-C lets in-flight requests finish; a second one exits at once.
fn spawn_interrupt_handler(interrupt: Interrupt) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted, waiting for in-flight requests (Ctrl-C again to abort)");
        interrupt.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelled");
            std::process::exit(2);
        }
    });
}
