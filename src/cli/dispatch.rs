use std::process::ExitCode;

use anyhow::Result;

use super::check::cmd_check;
use super::commands::Commands;
use super::env::CliArgs;
use super::listing::cmd_commands;
use super::run::cmd_run;
use crate::cli::context::CliContext;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<ExitCode> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Check(args) => cmd_check(args).await,
        Commands::Commands => cmd_commands(),
    }
}
