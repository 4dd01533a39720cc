//! Command implementations

mod config;
mod download;
mod months;
mod tile;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;
use vegflow_core::acquisition::TaskId;
use vegflow_core::config::LayeredConfig;

/// Everything a command needs besides its own arguments
pub struct CommandContext {
    pub output: OutputWriter,
    pub config: LayeredConfig,
    pub dry_run: bool,
    /// Id for a download task, fixed up front so log files can be named after it
    pub task_id: TaskId,
}

/// Execute a CLI command
pub async fn execute(cli: Cli, ctx: CommandContext) -> Result<()> {
    match cli.command {
        Commands::Tile(args) => tile::execute(args, &ctx).await,
        Commands::Months(args) => months::execute(args, &ctx),
        Commands::Download(args) => download::execute(args, &ctx).await,
        Commands::Config => config::execute(&ctx),
    }
}
