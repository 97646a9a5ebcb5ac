// duux-core: Polling coordinator and repair escalation for one Duux fan.

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod repair;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::FanBackend;
pub use config::{CoordinatorConfig, TlsVerification};
pub use coordinator::Coordinator;
pub use error::{CoreError, ErrorKind};
pub use repair::{
    AUTH_FAILURE_THRESHOLD, IssueSeverity, REPAIR_ISSUE_AUTH_FAILED, RepairIssue, RepairState,
    RepairTracker, Transition,
};

// Wire-level types hosts need alongside the coordinator.
pub use duux_api::{
    Command, Credentials, DeviceId, DeviceState, Field, MAX_SPEED, MIN_SPEED, Protocol,
    percentage_to_speed, speed_to_percentage,
};
