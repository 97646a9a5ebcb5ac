//! Write commands: raw field writes and the on/off/speed/toggle intents.
//!
//! Each handler goes through the coordinator, which validates, sends,
//! and re-reads the fan; the confirmed state is printed afterwards.

use duux_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

use super::status;

pub async fn handle(
    cmd: Command,
    coordinator: &mut Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Set { field, value } => coordinator.apply_command(field, value).await?,
        Command::On { percentage } => coordinator.turn_on(percentage).await?,
        Command::Off => coordinator.turn_off().await?,
        Command::Speed { percentage } => coordinator.set_percentage(percentage).await?,
        Command::Oscillate { state } => coordinator.set_oscillating(state.is_on()).await?,
        Command::Night { state } => coordinator.set_night_mode(state.is_on()).await?,
        Command::NaturalWind { state } => coordinator.set_natural_wind(state.is_on()).await?,
        Command::Lock { state } => coordinator.set_lock(state.is_on()).await?,
        // Routed elsewhere by `commands::dispatch`
        Command::Status
        | Command::Watch(_)
        | Command::Config(_)
        | Command::Completions(_) => unreachable!(),
    };

    status::print(coordinator, global)
}
