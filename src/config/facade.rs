//! Loader facade: builds the layered config and deserializes it.

use super::merge;
use super::sources::{environment, explicit_file, global_file};
use super::{AppConfig, LocationConfig};
use crate::error::ApiError;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, Source};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, then environment overrides.
    pub fn load() -> Result<AppConfig, ApiError> {
        let path = global_file::global_config_path();
        let builder = merge::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, path.as_deref())?;
        let mut config = Self::finish(environment::add_to_builder(builder))?;
        if let Some(path) = path {
            restore_location_keys(&mut config, &path)?;
        }
        Ok(config)
    }

    /// Defaults, then `path` in place of the global file, then environment overrides.
    pub fn load_from_file(path: &Path) -> Result<AppConfig, ApiError> {
        let builder = merge::builder_with_defaults()?;
        let builder = explicit_file::add_to_builder(builder, path)?;
        debug!(config_path = %path.display(), "using explicit configuration");
        let mut config = Self::finish(environment::add_to_builder(builder))?;
        restore_location_keys(&mut config, path)?;
        Ok(config)
    }

    /// Pick [`Self::load_from_file`] when an explicit path is given.
    pub fn load_with(path: Option<&Path>) -> Result<AppConfig, ApiError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    /// Path of the global config file that [`Self::load`] would read.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<AppConfig, ApiError> {
        Self::finish(merge::builder_with_defaults()?)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ApiError> {
        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

/// The merged config tree lowercases every key, but location keys are opaque and
/// must match what callers pass on the command line. Re-read the file's `locations`
/// table as written and move each merged entry back under its original key.
/// Keys that only differ by case collapse when merged, so those take the file's
/// entry unchanged.
fn restore_location_keys(config: &mut AppConfig, path: &Path) -> Result<(), ConfigError> {
    let mut table = File::from(path).collect()?;
    let written: HashMap<String, LocationConfig> = match table.remove("locations") {
        Some(value) => value.try_deserialize()?,
        None => return Ok(()),
    };

    let mut folded: HashMap<String, usize> = HashMap::new();
    for key in written.keys() {
        *folded.entry(key.to_lowercase()).or_default() += 1;
    }

    for (key, location) in written {
        let lower = key.to_lowercase();
        if folded[&lower] > 1 {
            config.locations.insert(key, location);
        } else if key != lower {
            let merged = config.locations.remove(&lower).unwrap_or(location);
            config.locations.insert(key, merged);
        }
    }
    Ok(())
}
