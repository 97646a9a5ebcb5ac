//! `duux watch`: the host-side scheduler loop.
//!
//! Calls `refresh()` on a fixed cadence, prints field changes and repair
//! transitions, and stops on Ctrl-C or after `--count` cycles.

use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use duux_core::{Coordinator, DeviceState, RepairState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::status;

fn timestamp() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

fn emit(global: &GlobalOpts, text: String, event: &serde_json::Value) {
    let line = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => event.to_string(),
        OutputFormat::Table | OutputFormat::Plain => text,
    };
    output::print_output(&line, global.quiet);
}

fn report_state(previous: Option<&DeviceState>, state: &DeviceState, global: &GlobalOpts) {
    let Some(previous) = previous else {
        let summary = status::plain(state).replace('\n', " ");
        emit(
            global,
            format!("{} {summary}", timestamp()),
            &json!({ "event": "state", "state": state }),
        );
        return;
    };

    for field in previous.changed_fields(state) {
        let (from, to) = (previous.value_of(field), state.value_of(field));
        emit(
            global,
            format!("{} {field}: {from} -> {to}", timestamp()),
            &json!({ "event": "changed", "field": field.token(), "from": from, "to": to }),
        );
    }
}

fn report_repair(state: &RepairState, global: &GlobalOpts, color: bool) {
    match state {
        RepairState::Open(issue) => {
            let text = format!(
                "{} repair issue '{}' opened after {} rejected requests; run `duux config set-token`",
                timestamp(),
                issue.id,
                issue.failures
            );
            emit(
                global,
                output::warning(&text, color),
                &json!({ "event": "repair_opened", "issue": issue }),
            );
        }
        RepairState::Healthy => emit(
            global,
            format!("{} repair issue resolved", timestamp()),
            &json!({ "event": "repair_resolved" }),
        ),
    }
}

pub async fn handle(
    args: WatchArgs,
    coordinator: &mut Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let period = args
        .interval
        .map_or_else(|| coordinator.poll_interval(), Duration::from_secs);
    let color = output::should_color(&global.color);
    let mut repair = coordinator.subscribe_repair();

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    debug!(?period, device = %coordinator.device_id(), "watch started");

    let mut previous: Option<DeviceState> = None;
    let mut cycles: u32 = 0;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {}
        }

        match coordinator.refresh().await {
            Ok(state) => {
                report_state(previous.as_ref(), &state, global);
                previous = Some(state);
            }
            Err(err) => {
                eprintln!("{}", output::warning(&format!("refresh failed: {err}"), color));
            }
        }

        if repair.has_changed().unwrap_or(false) {
            let state = repair.borrow_and_update().clone();
            report_repair(&state, global, color);
        }

        cycles = cycles.saturating_add(1);
        if args.count.is_some_and(|limit| cycles >= limit) {
            break;
        }
    }

    Ok(())
}
