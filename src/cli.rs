//! CLI domain: parse, route, output, and presentation only.
//! No update logic; a single route table dispatches to the orchestrator.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_change_set, format_update_json, format_update_text};
pub use route::{CommandOutput, RunContext, EXIT_PARTIAL};
