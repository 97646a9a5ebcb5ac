//! `duux status` and the shared state view used by every write command.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use duux_core::{Coordinator, DeviceState, Field, MAX_SPEED, RepairIssue, RepairState};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── View model ──────────────────────────────────────────────────────

/// Everything the coordinator knows about the fan after one operation.
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub device_id: String,
    pub available: bool,
    pub percentage: Option<u8>,
    pub state: Option<DeviceState>,
    pub last_updated: Option<DateTime<Utc>>,
    pub consecutive_auth_failures: u32,
    pub repair: Option<RepairIssue>,
}

impl StatusView {
    pub fn from_coordinator(coordinator: &Coordinator) -> Self {
        let state = coordinator.last_state().copied();
        Self {
            device_id: coordinator.device_id().to_string(),
            available: coordinator.is_available(),
            percentage: state.and_then(|s| s.percentage()),
            state,
            last_updated: coordinator.last_updated(),
            consecutive_auth_failures: coordinator.consecutive_auth_failures(),
            repair: match coordinator.repair_state() {
                RepairState::Open(issue) => Some(issue),
                RepairState::Healthy => None,
            },
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    setting: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(setting: &'static str, value: impl Into<String>) -> SettingRow {
    SettingRow {
        setting,
        value: value.into(),
    }
}

fn rows(view: &StatusView, color: bool) -> Vec<SettingRow> {
    let mut rows = vec![row("Device", view.device_id.clone())];

    match view.state {
        Some(s) => {
            rows.push(row("Power", output::on_off(s.power, color)));
            rows.push(row(
                "Speed",
                match view.percentage {
                    Some(pct) => format!("{}/{MAX_SPEED} ({pct}%)", s.speed),
                    None => format!("{}/{MAX_SPEED}", s.speed),
                },
            ));
            rows.push(row(
                "Oscillation",
                format!(
                    "horizontal {}, vertical {}",
                    s.horizontal_oscillation, s.vertical_oscillation
                ),
            ));
            rows.push(row(
                "Mode",
                if s.natural_wind() {
                    "natural wind".to_owned()
                } else {
                    s.mode.to_string()
                },
            ));
            rows.push(row("Night mode", output::on_off(s.night_mode, color)));
            rows.push(row("Child lock", output::on_off(s.lock, color)));
        }
        None => rows.push(row("State", "unavailable")),
    }

    if let Some(at) = view.last_updated {
        rows.push(row("Updated", at.format("%Y-%m-%d %H:%M:%S UTC").to_string()));
    }
    if let Some(ref issue) = view.repair {
        rows.push(row(
            "Repair",
            output::warning(
                &format!("{} ({} auth failures)", issue.id, issue.failures),
                color,
            ),
        ));
    }
    rows
}

/// `token=value` per field, in wire order.
pub fn plain(state: &DeviceState) -> String {
    Field::iter()
        .map(|f| format!("{}={}", f.token(), state.value_of(f)))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rendering ───────────────────────────────────────────────────────

/// Print the coordinator's current view in the selected format.
pub fn print(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let view = StatusView::from_coordinator(coordinator);
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| rows(v, color),
        |v| v.state.as_ref().map(plain).unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(coordinator: &mut Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    coordinator.refresh().await?;
    print(coordinator, global)
}
