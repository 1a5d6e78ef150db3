//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name as used in log fields (e.g. "generate", "set_state").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate(_) => "generate",
        Commands::Update(_) => "update",
        Commands::StartUpdate(_) => "start_update",
        Commands::SetState { .. } => "set_state",
        Commands::GetState { .. } => "get_state",
        Commands::Operations { .. } => "operations",
    }
}

/// Whether the command writes state and should be followed by post commands.
pub fn runs_post_commands(command: &Commands) -> bool {
    matches!(command, Commands::Update(_) | Commands::SetState { .. })
}

/// Read-only commands run on every status refresh and complete at `debug`.
pub fn is_read_only(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Generate(_) | Commands::GetState { .. } | Commands::Operations { .. }
    )
}
