use std::path::{Path, PathBuf};

use crate::config::Config;

/// Loaded configuration shared by every subcommand
pub struct CliContext {
    config: Config,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
