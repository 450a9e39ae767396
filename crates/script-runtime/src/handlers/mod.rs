//! Command implementations, grouped by what they act on.
//!
//! Every handler receives arguments already normalized against its
//! [`CommandSpec`](crate::registry::CommandSpec), so arity mismatches here
//! indicate a table/handler disagreement rather than a script error.

pub(crate) mod assertions;
pub(crate) mod cookies;
pub(crate) mod element;
pub(crate) mod navigation;
pub(crate) mod page;
pub(crate) mod session;
pub(crate) mod text;
pub(crate) mod waits;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use soulscript_core_types::{ElementRef, Locator, Strategy};

use crate::context::ExecutionContext;
use crate::fault::Fault;

pub(crate) type HandlerResult = Result<(), Fault>;

pub(crate) fn arity(command: &str, args: &[String]) -> Fault {
    Fault::InvalidArgument(format!(
        "`{command}` received {} argument(s) it cannot interpret",
        args.len()
    ))
}

pub(crate) fn locator(strategy: &str, selector: &str) -> Result<Locator, Fault> {
    let strategy =
        Strategy::parse(strategy).ok_or_else(|| Fault::UnknownSelectorStrategy(strategy.to_string()))?;
    Ok(Locator::new(strategy, selector))
}

pub(crate) async fn element(
    ctx: &ExecutionContext,
    strategy: &str,
    selector: &str,
) -> Result<ElementRef, Fault> {
    let locator = locator(strategy, selector)?;
    Ok(ctx.automation().locate(&locator).await?)
}

pub(crate) fn parse_number<T: FromStr>(raw: &str, what: &str) -> Result<T, Fault> {
    raw.trim()
        .parse()
        .map_err(|_| Fault::InvalidArgument(format!("{what} must be an integer, got `{raw}`")))
}

/// Optional trailing wait timeout in whole seconds
pub(crate) fn timeout(ctx: &ExecutionContext, raw: Option<&String>) -> Result<Duration, Fault> {
    match raw.map(|value| value.trim()).filter(|value| !value.is_empty()) {
        Some(value) => Ok(Duration::from_secs(parse_number::<u64>(value, "timeout")?)),
        None => Ok(ctx.default_timeout()),
    }
}

/// Expand a leading `~` to the home directory
pub(crate) fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

pub(crate) fn ensure_parent(path: &Path) -> HandlerResult {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|err| Fault::Io(format!("cannot create {}: {err}", parent.display()))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_parse_case_insensitively() {
        assert_eq!(locator("xpath", "//a").unwrap().strategy, Strategy::XPath);
        assert_eq!(
            locator("shadow", "x").unwrap_err(),
            Fault::UnknownSelectorStrategy("shadow".into())
        );
    }

    #[test]
    fn numbers_reject_garbage() {
        assert_eq!(parse_number::<i64>(" -40 ", "dx").unwrap(), -40);
        assert!(matches!(
            parse_number::<u64>("1.5", "timeout"),
            Err(Fault::InvalidArgument(_))
        ));
    }

    #[test]
    fn home_prefix_expands() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/shots/a.png"), home.join("shots/a.png"));
        }
        assert_eq!(expand_home("shots/~a.png"), PathBuf::from("shots/~a.png"));
    }

    #[test]
    fn parents_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c.png");
        ensure_parent(&target).unwrap();
        assert!(dir.path().join("a/b").is_dir());
        ensure_parent(Path::new("bare.png")).unwrap();
    }
}
