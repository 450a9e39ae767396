//! Runner configuration loaded from YAML
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! Command line flags are applied on top in `cli::run`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Timeout for `wait_*` commands without an explicit one
    pub default_timeout_secs: u64,
    pub ignore_error: bool,
    /// Hold the browser open after an aborted run
    pub error_no_quit: bool,
    pub start_url: Option<String>,
    pub maximize: bool,
    pub browser: BrowserSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
    pub profile_directory: Option<String>,
    pub user_agent: Option<String>,
    /// `host:port` of a browser started with remote debugging
    pub debugger_address: Option<String>,
    pub window_size: Option<WindowSize>,
    pub net_harden: bool,
    pub stealth: bool,
    pub netlog: Option<PathBuf>,
    pub extra_args: Vec<String>,
    pub launch_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timeout_secs: 15,
            ignore_error: false,
            error_no_quit: false,
            start_url: None,
            maximize: false,
            browser: BrowserSettings::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: false,
            user_data_dir: None,
            profile_directory: None,
            user_agent: None,
            debugger_address: None,
            window_size: None,
            net_harden: false,
            stealth: false,
            netlog: None,
            extra_args: Vec::new(),
            launch_timeout_secs: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            "ignore_error: true\nbrowser:\n  headless: true\n  window_size: { width: 1280, height: 800 }\n",
        )
        .unwrap();
        assert!(config.ignore_error);
        assert_eq!(config.default_timeout_secs, 15);
        assert!(config.browser.headless);
        assert_eq!(config.browser.launch_timeout_secs, 20);
        assert_eq!(
            config.browser.window_size,
            Some(WindowSize {
                width: 1280,
                height: 800
            })
        );
    }

    #[test]
    fn empty_document_is_default() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(!config.maximize);
        assert!(config.browser.extra_args.is_empty());
    }
}
