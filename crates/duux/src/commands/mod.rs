//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod config_cmd;
pub mod control;
pub mod status;
pub mod watch;

use duux_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a fan-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &mut Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(coordinator, global).await,
        Command::Watch(args) => watch::handle(args, coordinator, global).await,
        cmd @ (Command::Set { .. }
        | Command::On { .. }
        | Command::Off
        | Command::Speed { .. }
        | Command::Oscillate { .. }
        | Command::Night { .. }
        | Command::NaturalWind { .. }
        | Command::Lock { .. }) => control::handle(cmd, coordinator, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
