use std::process::ExitCode;

use anyhow::Result;
use soulscript_runtime::{aliases_for, commands, CommandSpec};

fn arity(spec: &CommandSpec) -> String {
    match spec.max_args {
        Some(max) if max == spec.min_args => max.to_string(),
        Some(max) => format!("{}..{}", spec.min_args, max),
        None => format!("{}..", spec.min_args),
    }
}

/// One registry row: name, arity, usage, then join and alias notes
pub fn describe(spec: &CommandSpec) -> String {
    let mut line = format!("{:<22} {:<6} {}", spec.name, arity(spec), spec.usage);
    if let Some(join) = spec.join_from {
        line.push_str(&format!("  [joins from arg {join}]"));
    }
    let aliases = aliases_for(spec.name);
    if !aliases.is_empty() {
        line.push_str(&format!("  (alias: {})", aliases.join(", ")));
    }
    line.trim_end().to_string()
}

pub fn cmd_commands() -> Result<ExitCode> {
    for spec in commands() {
        println!("{}", describe(spec));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulscript_runtime::lookup;

    #[test]
    fn rows_show_arity_joins_and_aliases() {
        let click = describe(lookup("click").unwrap());
        assert!(click.starts_with("click"));
        assert!(click.contains(" 2 "));
        assert!(click.ends_with("(alias: L_click)"));

        let assert_text = describe(lookup("assert_text").unwrap());
        assert!(assert_text.contains("3.."));
        assert!(assert_text.contains("[joins from arg 2]"));

        assert!(describe(lookup("wait_text").unwrap()).contains("3..4"));
    }
}
