//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to the engines.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, is_read_only, runs_post_commands};
pub use output::map_error;
pub use parse::{Cli, Commands, TargetArgs};
pub use presentation::format_operations;
pub use route::RunContext;
