//! Filesystem locations: config directory, default state database and log file.

use directories::BaseDirs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "paneline";

/// `$XDG_CONFIG_HOME/paneline`, falling back to `~/.config/paneline`.
pub fn config_dir() -> Option<PathBuf> {
    let xdg = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    resolve_config_dir(xdg, home)
}

pub(crate) fn resolve_config_dir(xdg: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    match xdg {
        Some(dir) if dir.is_absolute() => Some(dir.join(APP_DIR)),
        _ => home.map(|h| h.join(".config").join(APP_DIR)),
    }
}

/// Default directory for the sled state database.
pub fn default_state_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from(".paneline"))
        .join("state")
}

/// Default log file; stdout is reserved for generated content.
pub fn default_log_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from(".paneline"))
        .join("paneline.log")
}

/// Expand a leading `~` against the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    expand_home_with(path, home.as_deref())
}

pub(crate) fn expand_home_with(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
