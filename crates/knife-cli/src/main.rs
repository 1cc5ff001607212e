//! knife CLI
//!
//! Browse, compare and synchronise a local Chef repository with a server.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;

use cli::{Cli, Commands};
use commands::Direction;
use context::KnifeContext;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        match e {
            CliError::User { message } => logging::fatal(message),
            CliError::PathsFailed => {}
            other => logging::error(other.to_string()),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let ctx = KnifeContext::from_cli(&cli)?;
    execute_command(&ctx, &cli.command)
}

fn execute_command(ctx: &KnifeContext, cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::List(args) => commands::run_list(ctx, args),
        Commands::Diff(args) => commands::run_diff(ctx, args),
        Commands::Upload(args) => commands::run_sync(ctx, args, Direction::Upload),
        Commands::Download(args) => commands::run_sync(ctx, args, Direction::Download),
        Commands::Delete(args) => commands::run_delete(ctx, args),
        Commands::Show(args) => commands::run_show(ctx, args),
        Commands::Edit(args) => commands::run_edit(ctx, args),
        Commands::Xargs(args) => commands::run_xargs(ctx, args),
    }
}
