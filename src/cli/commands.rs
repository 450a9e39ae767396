use clap::Subcommand;

use super::check::CheckArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run a command script against a browser
    Run(RunArgs),

    /// Validate a script without starting a browser
    Check(CheckArgs),

    /// List every script command with its arity and aliases
    Commands,
}
