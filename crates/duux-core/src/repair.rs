// ── Repair escalation ──
//
// Two states and one counter. Three consecutive authentication failures
// open an `auth_failed` issue; the next authenticated success resolves it.

use chrono::{DateTime, Utc};
use duux_api::DeviceId;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

/// Consecutive authentication failures that open a repair issue.
pub const AUTH_FAILURE_THRESHOLD: u32 = 3;

/// Issue identifier surfaced to the host's repair registry.
pub const REPAIR_ISSUE_AUTH_FAILED: &str = "auth_failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IssueSeverity {
    Error,
}

/// A persistent, user-visible fault notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairIssue {
    pub id: &'static str,
    pub device_id: String,
    pub severity: IssueSeverity,
    /// Consecutive failures at the moment the issue opened.
    pub failures: u32,
    pub opened_at: DateTime<Utc>,
}

/// Observable repair state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairState {
    Healthy,
    Open(RepairIssue),
}

impl RepairState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

/// Result of feeding one authenticated outcome into the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Opened(RepairIssue),
    Resolved(RepairIssue),
}

/// Owns the failure counter and publishes state changes on a watch channel.
#[derive(Debug)]
pub struct RepairTracker {
    device_id: DeviceId,
    consecutive_auth_failures: u32,
    state: watch::Sender<RepairState>,
}

impl RepairTracker {
    pub fn new(device_id: DeviceId) -> Self {
        let (state, _) = watch::channel(RepairState::Healthy);
        Self {
            device_id,
            consecutive_auth_failures: 0,
            state,
        }
    }

    pub fn consecutive_auth_failures(&self) -> u32 {
        self.consecutive_auth_failures
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    pub fn state(&self) -> RepairState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RepairState> {
        self.state.subscribe()
    }

    /// Any call the vendor accepted with our token.
    pub fn record_success(&mut self) -> Transition {
        self.consecutive_auth_failures = 0;
        // Subscribers are only woken by real transitions.
        if !self.is_open() {
            return Transition::Unchanged;
        }
        match self.state.send_replace(RepairState::Healthy) {
            RepairState::Open(issue) => {
                info!(device = %self.device_id, issue = issue.id, "repair issue resolved");
                Transition::Resolved(issue)
            }
            RepairState::Healthy => Transition::Unchanged,
        }
    }

    /// The vendor rejected our token.
    pub fn record_auth_failure(&mut self) -> Transition {
        self.consecutive_auth_failures = self.consecutive_auth_failures.saturating_add(1);
        let failures = self.consecutive_auth_failures;

        if failures < AUTH_FAILURE_THRESHOLD || self.is_open() {
            return Transition::Unchanged;
        }

        let issue = RepairIssue {
            id: REPAIR_ISSUE_AUTH_FAILED,
            device_id: self.device_id.to_string(),
            severity: IssueSeverity::Error,
            failures,
            opened_at: Utc::now(),
        };
        warn!(
            device = %self.device_id,
            failures,
            "token rejected repeatedly, opening repair issue"
        );
        self.state.send_replace(RepairState::Open(issue.clone()));
        Transition::Opened(issue)
    }
}
