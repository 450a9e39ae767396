use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use soulscript_runtime::{check_file, VariableStore};
use tracing::info;

use super::run::parse_var;

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Script file to validate
    pub script: PathBuf,

    /// Predefine a script variable (repeatable); the value is used verbatim
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

pub async fn cmd_check(args: CheckArgs) -> Result<ExitCode> {
    let mut seed = VariableStore::new();
    for (name, value) in &args.vars {
        seed.set(name, value.as_str())
            .with_context(|| format!("Invalid --var {name}"))?;
    }

    let faults = check_file(&args.script, seed)
        .with_context(|| format!("Failed to check {}", args.script.display()))?;
    if faults.is_empty() {
        info!(script = %args.script.display(), "script is valid");
        println!("{}: ok", args.script.display());
        return Ok(ExitCode::SUCCESS);
    }

    for fault in &faults {
        println!("{}:{fault}", args.script.display());
    }
    eprintln!("{} problem(s) found", faults.len());
    Ok(ExitCode::FAILURE)
}
