//! Global config file source: $XDG_CONFIG_HOME/paneline/config.{toml,yaml,json}

use crate::config::paths;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSIONS: [&str; 3] = ["toml", "yaml", "json"];

/// First existing global config file, if any.
pub fn global_config_path() -> Option<PathBuf> {
    paths::config_dir().and_then(|dir| find_in(&dir))
}

pub(crate) fn find_in(dir: &Path) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("config.{}", ext)))
        .find(|candidate| candidate.is_file())
}

/// Add the global config file found by [`global_config_path`], if any.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: Option<&Path>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match path {
        Some(path) => {
            debug!(config_path = %path.display(), "using global configuration");
            Ok(builder.add_source(File::from(path).required(false)))
        }
        None => {
            debug!("no global configuration file found");
            Ok(builder)
        }
    }
}
