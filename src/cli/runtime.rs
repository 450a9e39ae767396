use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOCAL_ENV: &str = "config/local.env";
const LOCAL_CONFIG: &str = "config/soulscript.yaml";

/// Export `config/local.env` entries that the environment does not already set.
pub fn load_local_env_overrides() {
    let path = Path::new(LOCAL_ENV);
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
        Err(err) => {
            warn!(path = %path.display(), ?err, "cannot read local.env overrides");
            return;
        }
    };

    let mut exported = 0usize;
    for (key, value) in parse_env_lines(&contents) {
        if env::var_os(&key).is_none() {
            env::set_var(key, value);
            exported += 1;
        }
    }
    info!(path = %path.display(), exported, "applied local.env overrides");
}

/// `KEY=value` pairs from a local.env body; comments and malformed lines are skipped.
fn parse_env_lines(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            match line.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    Some((key.trim().to_string(), unquote(value.trim())))
                }
                _ => {
                    warn!(line = idx + 1, "ignoring malformed local.env entry");
                    None
                }
            }
        })
        .collect()
}

/// Strip one level of quotes. Double quotes honour `\n`, `\t`, `\r`, `\"`
/// and `\\`; single quotes are literal.
fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return value[1..value.len() - 1].to_string();
    }
    if !(value.len() >= 2 && value.starts_with('"') && value.ends_with('"')) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value[1..value.len() - 1].chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Logs go to stderr; stdout is reserved for script output.
pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level: tracing::Level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) if !debug => filter,
        _ => EnvFilter::new(level.to_string()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug),
        )
        .init();

    Ok(())
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

/// Where to look when `--config` is absent, most specific first.
fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("soulscript").join("config.yaml"));
    }
    candidates
}

fn resolve_config_path(explicit: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path.clone();
    }
    let candidates = config_candidates();
    candidates
        .iter()
        .find(|path| path.exists())
        .or_else(|| candidates.last())
        .cloned()
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG))
}

pub async fn load_config(explicit: Option<&PathBuf>) -> Result<LoadedConfig> {
    let path = resolve_config_path(explicit);
    debug!(path = %path.display(), "resolving configuration");

    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(LoadedConfig {
            config: Config::default(),
            path,
        });
    }

    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = if raw.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?
    };
    info!(path = %path.display(), "loaded configuration");
    Ok(LoadedConfig { config, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_lines_skip_comments_and_unquote() {
        let pairs = parse_env_lines(
            "# comment\nRUST_LOG=debug\n\nbroken\nGREETING=\"a\\tb\"\nexport RAW='x\\ny'\n =x\n",
        );
        assert_eq!(
            pairs,
            vec![
                ("RUST_LOG".to_string(), "debug".to_string()),
                ("GREETING".to_string(), "a\tb".to_string()),
                ("RAW".to_string(), "x\\ny".to_string()),
            ]
        );
    }

    #[test]
    fn explicit_path_wins_over_candidates() {
        let explicit = PathBuf::from("/nowhere/custom.yaml");
        assert_eq!(resolve_config_path(Some(&explicit)), explicit);
    }

    #[tokio::test]
    async fn explicit_config_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("soulscript.yaml");
        std::fs::write(&path, "default_timeout_secs: 30\nmaximize: true\n").unwrap();
        let loaded = load_config(Some(&path)).await.unwrap();
        assert_eq!(loaded.config.default_timeout_secs, 30);
        assert!(loaded.config.maximize);
        assert_eq!(loaded.path, path);
    }

    #[tokio::test]
    async fn missing_or_empty_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.yaml");
        let loaded = load_config(Some(&absent)).await.unwrap();
        assert_eq!(loaded.config.default_timeout_secs, 15);

        let empty = dir.path().join("empty.yaml");
        std::fs::write(&empty, "\n").unwrap();
        let loaded = load_config(Some(&empty)).await.unwrap();
        assert_eq!(loaded.config.default_timeout_secs, 15);
    }

    #[tokio::test]
    async fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "default_timeout_secs: soon\n").unwrap();
        assert!(load_config(Some(&path)).await.is_err());
    }
}
