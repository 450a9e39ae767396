use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use action_primitives::{Automation, RecordingAutomation};
use anyhow::{Context, Result};
use clap::Args;
use soulscript_core_types::{Action, Navigation, WindowOp};
use soulscript_runtime::{ErrorPolicy, ExecutionContext, RunReport, RunState, ScriptRunner};
use tracing::{debug, info, warn};

use super::context::CliContext;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Script file to execute
    pub script: PathBuf,

    /// Log failing lines and continue instead of aborting
    #[arg(long)]
    pub ignore_error: bool,

    /// Default wait timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// URL opened before the first line runs
    #[arg(long, value_name = "URL")]
    pub start_url: Option<String>,

    /// Run without a visible window
    #[arg(long)]
    pub headless: bool,

    /// Chrome/Chromium executable
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Browser profile root; a locked one is replaced by a fresh sibling
    #[arg(long, value_name = "DIR")]
    pub user_data_dir: Option<PathBuf>,

    /// Profile inside the user data dir, e.g. "Profile 1"
    #[arg(long, value_name = "NAME")]
    pub profile_directory: Option<String>,

    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Attach to a running browser (host:port) instead of launching one
    #[arg(long, value_name = "ADDR")]
    pub debugger_address: Option<String>,

    /// Maximize the window before running (ignored when headless)
    #[arg(long)]
    pub maximize: bool,

    /// Relax certificate checks and disable QUIC/HTTP2
    #[arg(long)]
    pub net_harden: bool,

    /// Keep the browser open when the script aborts
    #[arg(long)]
    pub error_no_quit: bool,

    /// Hide the automation flag from pages
    #[arg(long)]
    pub stealth: bool,

    /// Write a Chrome net log to FILE
    #[arg(long, value_name = "FILE")]
    pub netlog: Option<PathBuf>,

    /// Predefine a script variable (repeatable); the value is used verbatim
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Record commands against an in-memory page instead of a browser
    #[arg(long)]
    pub dry_run: bool,
}

pub(crate) fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}

impl RunArgs {
    /// Flags win over the configuration file.
    fn apply(&self, mut config: Config) -> Config {
        config.ignore_error |= self.ignore_error;
        config.error_no_quit |= self.error_no_quit;
        config.maximize |= self.maximize;
        if let Some(timeout) = self.timeout {
            config.default_timeout_secs = timeout;
        }
        if let Some(url) = &self.start_url {
            config.start_url = Some(url.clone());
        }

        let browser = &mut config.browser;
        browser.headless |= self.headless;
        browser.net_harden |= self.net_harden;
        browser.stealth |= self.stealth;
        if let Some(path) = &self.chrome_path {
            browser.executable = Some(path.clone());
        }
        if let Some(dir) = &self.user_data_dir {
            browser.user_data_dir = Some(dir.clone());
        }
        if let Some(profile) = &self.profile_directory {
            browser.profile_directory = Some(profile.clone());
        }
        if let Some(agent) = &self.user_agent {
            browser.user_agent = Some(agent.clone());
        }
        if let Some(address) = &self.debugger_address {
            browser.debugger_address = Some(address.clone());
        }
        if let Some(netlog) = &self.netlog {
            browser.netlog = Some(netlog.clone());
        }
        config
    }
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<ExitCode> {
    let config = args.apply(ctx.config().clone());
    debug!(config = %ctx.config_path().display(), ?config, "effective configuration");

    let automation: Arc<dyn Automation> = if args.dry_run {
        info!("dry run: commands are recorded, no browser is started");
        Arc::new(RecordingAutomation::new())
    } else {
        super::provision::provision(&config.browser).await?
    };

    let outcome = drive(&args, &config, Arc::clone(&automation)).await;
    let code = match outcome {
        Ok(Some(report)) => settle(&report, &config, args.dry_run).await,
        Ok(None) => ExitCode::from(130),
        Err(err) => {
            release(automation.as_ref()).await;
            return Err(err);
        }
    };
    release(automation.as_ref()).await;
    Ok(code)
}

/// Prepare the page and run the script. `None` means the operator interrupted.
async fn drive(
    args: &RunArgs,
    config: &Config,
    automation: Arc<dyn Automation>,
) -> Result<Option<RunReport>> {
    if config.maximize {
        if config.browser.headless {
            debug!("maximize skipped in headless mode");
        } else if let Err(err) = automation.perform(Action::Window(WindowOp::Maximize)).await {
            warn!(error = %err, "could not maximize the window");
        }
    }
    if let Some(url) = &config.start_url {
        automation
            .navigate(Navigation::Goto(url.clone()))
            .await
            .with_context(|| format!("Failed to open start URL {url}"))?;
    }

    let policy = if config.ignore_error {
        ErrorPolicy::IgnoreErrors
    } else {
        ErrorPolicy::Strict
    };
    let context = ExecutionContext::new(automation)
        .with_default_timeout(Duration::from_secs(config.default_timeout_secs))
        .with_policy(policy);
    let mut runner = ScriptRunner::new(context);
    for (name, value) in &args.vars {
        runner = runner
            .with_variable(name, value.as_str())
            .with_context(|| format!("Invalid --var {name}"))?;
    }

    tokio::select! {
        report = runner.run_file(&args.script) => {
            let report = report.with_context(|| format!("Failed to run {}", args.script.display()))?;
            Ok(Some(report))
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; releasing the browser");
            Ok(None)
        }
    }
}

async fn settle(report: &RunReport, config: &Config, dry_run: bool) -> ExitCode {
    match &report.state {
        RunState::Completed => {
            if !report.skipped.is_empty() {
                warn!(skipped = report.skipped.len(), "lines failed and were skipped");
            }
            if report.keep_open {
                hold_open("script finished", dry_run).await;
            }
            ExitCode::SUCCESS
        }
        RunState::Aborted(fault) => {
            eprintln!("error: {fault}");
            if report.keep_open {
                info!("keep_open is not honoured after an aborted run");
            }
            if config.error_no_quit {
                hold_open("script aborted", dry_run).await;
            }
            ExitCode::FAILURE
        }
        RunState::Running => ExitCode::FAILURE,
    }
}

async fn hold_open(reason: &str, dry_run: bool) {
    if dry_run {
        info!("{reason}; no browser to hold open in a dry run");
        return;
    }
    eprintln!("{reason}; the browser stays open. Press Ctrl+C to exit.");
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "cannot listen for Ctrl+C; closing now");
    }
}

async fn release(automation: &dyn Automation) {
    if let Err(err) = automation.shutdown().await {
        warn!(error = %err, "browser shutdown failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunArgs,
    }

    #[test]
    fn vars_split_on_first_equals() {
        assert_eq!(
            parse_var("query=a=b").unwrap(),
            ("query".to_string(), "a=b".to_string())
        );
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn flags_override_configuration() {
        let harness = Harness::parse_from([
            "run",
            "script.txt",
            "--timeout",
            "5",
            "--headless",
            "--netlog",
            "net.json",
            "--var",
            "user=alice",
        ]);
        let mut config = Config::default();
        config.start_url = Some("https://from-config.test".into());
        let config = harness.run.apply(config);
        assert_eq!(config.default_timeout_secs, 5);
        assert!(config.browser.headless);
        assert_eq!(config.browser.netlog, Some(PathBuf::from("net.json")));
        assert_eq!(config.start_url.as_deref(), Some("https://from-config.test"));
        assert_eq!(harness.run.vars, vec![("user".into(), "alice".into())]);
    }
}
