//! vegflow CLI
//!
//! Command-line adapter for tiling ROIs and downloading monthly Landsat 8
//! composites with vegflow-core.

mod cli;
mod commands;
mod config_loader;
mod dry_run;
mod errors;
mod output;
mod output_types;
mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use commands::CommandContext;
use output::OutputWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vegflow_core::acquisition::TaskId;

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(error) = run(cli) {
        let cli_error = errors::from_anyhow(error);
        if json {
            println!("{}", cli_error.to_json());
        } else {
            cli_error.display();
        }
        std::process::exit(1);
    }
}

fn run(mut cli: Cli) -> Result<()> {
    // Tracing is only installed globally once the data directory is known,
    // so config loading logs through a temporary stderr subscriber
    let overrides = std::mem::take(&mut cli.overrides);
    let loading = fmt().with_env_filter(env_filter()).with_writer(std::io::stderr).finish();
    let config = tracing::subscriber::with_default(loading, || {
        config_loader::load_config(cli.config.as_deref(), overrides.into())
    })?;

    let task_id = TaskId::new();
    let log_file = match &cli.command {
        Commands::Download(args) if args.log_file && !cli.dry_run => {
            Some(open_log_file(&config.data_dir.value, task_id)?)
        }
        _ => None,
    };
    init_tracing(log_file);

    let ctx = CommandContext { output: OutputWriter::new(cli.json), config, dry_run: cli.dry_run, task_id };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(commands::execute(cli, ctx))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(log_file: Option<File>) {
    let file_layer =
        log_file.map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file)));

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
}

/// `<data_dir>/logs/<task_id>.log`
fn open_log_file(data_dir: &Path, task_id: TaskId) -> Result<File> {
    let logs = data_dir.join("logs");
    std::fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create log directory {}", logs.display()))?;

    let path = logs.join(format!("{}.log", task_id));
    File::create(&path).with_context(|| format!("Failed to create log file {}", path.display()))
}
