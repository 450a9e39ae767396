//! Turning browser settings into a live automation backend

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use action_primitives::{Automation, ChromiumAutomation, ChromiumConfig};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::BrowserSettings;

/// Files Chromium leaves in a profile directory that is in use
pub const LOCK_FILES: &[&str] = &[
    "SingletonLock",
    "SingletonCookie",
    "SingletonSocket",
    "SingletonStartupLock",
];

const NET_HARDEN_ARGS: &[&str] = &[
    "--ignore-certificate-errors",
    "--allow-insecure-localhost",
    "--disable-quic",
    "--disable-http2",
    "--disable-features=TLS13EarlyData",
];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let path = expand_home(path);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

pub fn has_lock_files(dir: &Path) -> bool {
    LOCK_FILES.iter().any(|name| dir.join(name).exists())
}

/// Create the profile directory if needed. A directory still locked by
/// another browser is swapped for a fresh `<name>_<unix-ts>` sibling.
pub fn prepare_user_data_dir(requested: &Path) -> Result<PathBuf> {
    let base = absolute(requested)?;
    std::fs::create_dir_all(&base)
        .with_context(|| format!("Failed to create user data dir {}", base.display()))?;
    if !has_lock_files(&base) {
        return Ok(base);
    }

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let name = base
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".to_string());
    let unique = base.with_file_name(format!("{name}_{stamp}"));
    std::fs::create_dir_all(&unique)
        .with_context(|| format!("Failed to create user data dir {}", unique.display()))?;
    warn!(
        locked = %base.display(),
        using = %unique.display(),
        "user data dir is locked; using a fresh sibling"
    );
    Ok(unique)
}

/// Command line switches derived from the settings, in launch order.
pub fn launch_args(settings: &BrowserSettings) -> Result<Vec<String>> {
    let mut args = Vec::new();
    if let Some(agent) = &settings.user_agent {
        args.push(format!("--user-agent={agent}"));
    }
    if let Some(profile) = &settings.profile_directory {
        args.push(format!("--profile-directory={profile}"));
    }
    if settings.stealth {
        args.push("--disable-blink-features=AutomationControlled".to_string());
    }
    if settings.net_harden {
        args.extend(NET_HARDEN_ARGS.iter().map(|arg| arg.to_string()));
    }
    if let Some(netlog) = &settings.netlog {
        let path = absolute(netlog)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create netlog dir {}", parent.display()))?;
        }
        args.push(format!("--log-net-log={}", path.display()));
        args.push("--net-log-capture-mode=IncludeSensitive".to_string());
    }
    args.extend(settings.extra_args.iter().cloned());
    Ok(args)
}

pub fn chromium_config(settings: &BrowserSettings) -> Result<ChromiumConfig> {
    let user_data_dir = settings
        .user_data_dir
        .as_deref()
        .map(prepare_user_data_dir)
        .transpose()?;
    if let Some(dir) = &user_data_dir {
        info!(path = %dir.display(), "using user data dir");
    }
    Ok(ChromiumConfig {
        executable: settings.executable.clone(),
        headless: settings.headless,
        user_data_dir,
        args: launch_args(settings)?,
        window_size: settings
            .window_size
            .map(|size| (size.width, size.height)),
        stealth: settings.stealth,
        launch_timeout: Duration::from_secs(settings.launch_timeout_secs),
        request_timeout: REQUEST_TIMEOUT,
    })
}

/// Attach to `debugger_address` when set, otherwise launch a new browser.
pub async fn provision(settings: &BrowserSettings) -> Result<Arc<dyn Automation>> {
    if let Some(address) = &settings.debugger_address {
        if settings.user_data_dir.is_some() || settings.user_agent.is_some() || settings.stealth {
            warn!("launch options are ignored when attaching to a running browser");
        }
        let automation = ChromiumAutomation::connect(address, REQUEST_TIMEOUT)
            .await
            .with_context(|| format!("Failed to attach to browser at {address}"))?;
        return Ok(Arc::new(automation));
    }

    let config = chromium_config(settings)?;
    let automation = ChromiumAutomation::launch(&config)
        .await
        .context("Failed to launch browser")?;
    Ok(Arc::new(automation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocked_dir_is_created_and_reused() {
        let root = tempfile::tempdir().unwrap();
        let requested = root.path().join("profile");
        let resolved = prepare_user_data_dir(&requested).unwrap();
        assert_eq!(resolved, requested);
        assert!(requested.is_dir());
    }

    #[test]
    fn locked_dir_gets_a_unique_sibling() {
        let root = tempfile::tempdir().unwrap();
        let requested = root.path().join("profile");
        std::fs::create_dir_all(&requested).unwrap();
        std::fs::write(requested.join("SingletonLock"), "").unwrap();

        let resolved = prepare_user_data_dir(&requested).unwrap();
        assert_ne!(resolved, requested);
        assert_eq!(resolved.parent(), requested.parent());
        assert!(resolved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("profile_"));
        assert!(resolved.is_dir());
    }

    #[test]
    fn switches_follow_settings() {
        let root = tempfile::tempdir().unwrap();
        let netlog = root.path().join("logs/net.json");
        let settings = BrowserSettings {
            user_agent: Some("Mozilla/5.0 test".into()),
            profile_directory: Some("Profile 2".into()),
            net_harden: true,
            stealth: true,
            netlog: Some(netlog.clone()),
            extra_args: vec!["--lang=en-US".into()],
            ..BrowserSettings::default()
        };
        let args = launch_args(&settings).unwrap();
        assert_eq!(args[0], "--user-agent=Mozilla/5.0 test");
        assert_eq!(args[1], "--profile-directory=Profile 2");
        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.contains(&"--disable-quic".to_string()));
        assert!(args.contains(&format!("--log-net-log={}", netlog.display())));
        assert!(args.contains(&"--net-log-capture-mode=IncludeSensitive".to_string()));
        assert_eq!(args.last().unwrap(), "--lang=en-US");
        assert!(root.path().join("logs").is_dir());
    }

    #[test]
    fn stealth_reaches_the_backend_config() {
        let settings = BrowserSettings {
            stealth: true,
            ..BrowserSettings::default()
        };
        let config = chromium_config(&settings).unwrap();
        assert!(config.stealth);
        assert!(config
            .args
            .contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(!chromium_config(&BrowserSettings::default()).unwrap().stealth);
    }

    #[test]
    fn defaults_add_no_switches() {
        assert!(launch_args(&BrowserSettings::default()).unwrap().is_empty());
    }
}
