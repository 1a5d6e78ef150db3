//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources replace earlier ones key by key. Tables merge; arrays such as
//! `post_commands` or a location's `operations` are replaced wholesale.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("state.backend", "sled")?
        .set_default("state.keep_open", false)?
        .set_default("state.open_timeout_ms", 2000_i64)?
        .set_default("update.timeout_ms", 30_000_i64)?
        .set_default("probe.timeout_ms", 5_000_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "file")
}
