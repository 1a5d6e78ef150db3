//! Environment source: `PANELINE__SECTION__KEY` overrides, e.g. `PANELINE__STATE__BACKEND=memory`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const PREFIX: &str = "PANELINE";
pub const SEPARATOR: &str = "__";

pub fn source() -> Environment {
    Environment::with_prefix(PREFIX)
        .prefix_separator(SEPARATOR)
        .separator(SEPARATOR)
        .try_parsing(true)
}

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(source())
}
