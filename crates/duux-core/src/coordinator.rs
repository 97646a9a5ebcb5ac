// ── Polling coordinator ──
//
// Holds the last-known-good state for one fan, classifies every outcome,
// and drives the repair escalation. The host's scheduler calls `refresh()`
// on its own cadence; nothing here starts a timer. Mutating calls take
// `&mut self`, so one instance can never have two operations in flight.

use std::time::Duration;

use chrono::{DateTime, Utc};
use duux_api::transport::{TlsMode, TransportConfig};
use duux_api::{Command, DeviceId, DeviceState, DuuxClient, Field, percentage_to_speed};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::FanBackend;
use crate::config::{
    CoordinatorConfig, DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_DELAY, TlsVerification,
};
use crate::error::CoreError;
use crate::repair::{RepairState, RepairTracker};

/// The host-facing handle for one fan.
#[derive(Debug)]
pub struct Coordinator<B = DuuxClient> {
    backend: B,
    device_id: DeviceId,
    poll_interval: Duration,
    settle_delay: Duration,
    last_state: Option<DeviceState>,
    last_updated: Option<DateTime<Utc>>,
    last_refresh_ok: bool,
    repair: RepairTracker,
}

impl Coordinator<DuuxClient> {
    /// Build the HTTP client and an empty coordinator. Does NOT fetch --
    /// the first `refresh()` populates the cache.
    ///
    /// A zero `timeout` or `poll_interval` is a `Config` error.
    pub fn new(config: CoordinatorConfig) -> Result<Self, CoreError> {
        if config.timeout.is_zero() || config.poll_interval.is_zero() {
            return Err(CoreError::Config {
                message: "timeout and poll interval must be non-zero".into(),
            });
        }
        let transport = build_transport(&config);
        let device_id = config.credentials.device_id.clone();
        let client = DuuxClient::new(
            config.api_url,
            config.credentials,
            config.protocol,
            &transport,
        )?;

        Ok(Self::with_backend(client, device_id)
            .with_poll_interval(config.poll_interval)
            .with_settle_delay(config.settle_delay))
    }
}

impl<B: FanBackend> Coordinator<B> {
    pub fn with_backend(backend: B, device_id: DeviceId) -> Self {
        Self {
            backend,
            repair: RepairTracker::new(device_id.clone()),
            device_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            last_state: None,
            last_updated: None,
            last_refresh_ok: false,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    // ── Host queries ─────────────────────────────────────────────

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Cadence the host's scheduler should call [`refresh`](Self::refresh) at.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Most recent successfully fetched state. Survives failed cycles.
    pub fn last_state(&self) -> Option<&DeviceState> {
        self.last_state.as_ref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Whether the most recent refresh cycle succeeded.
    pub fn last_refresh_succeeded(&self) -> bool {
        self.last_refresh_ok
    }

    /// `false` only while no state has ever been fetched.
    pub fn is_available(&self) -> bool {
        self.last_state.is_some()
    }

    pub fn consecutive_auth_failures(&self) -> u32 {
        self.repair.consecutive_auth_failures()
    }

    pub fn repair_active(&self) -> bool {
        self.repair.is_open()
    }

    pub fn repair_state(&self) -> RepairState {
        self.repair.state()
    }

    /// Subscribe to repair issue open/resolve transitions.
    pub fn subscribe_repair(&self) -> watch::Receiver<RepairState> {
        self.repair.subscribe()
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Fetch the fan's state and update the cache.
    ///
    /// On failure the cached state is left as it was and the classified
    /// error is returned; authentication failures also advance the repair
    /// counter.
    pub async fn refresh(&mut self) -> Result<DeviceState, CoreError> {
        match self.backend.fetch_status().await {
            Ok(state) => {
                self.last_state = Some(state);
                self.last_updated = Some(Utc::now());
                self.last_refresh_ok = true;
                self.repair.record_success();
                debug!(device = %self.device_id, ?state, "refresh complete");
                Ok(state)
            }
            Err(err) => {
                self.last_refresh_ok = false;
                let err = self.observe_failure(err);
                warn!(
                    device = %self.device_id,
                    kind = %err.kind(),
                    error = %err,
                    cached = self.last_state.is_some(),
                    "refresh failed"
                );
                Err(err)
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Write one field, then re-fetch to confirm.
    ///
    /// Out-of-domain values fail with [`CoreError::Validation`] before any
    /// request is made.
    pub async fn apply_command(
        &mut self,
        field: Field,
        value: i64,
    ) -> Result<DeviceState, CoreError> {
        let command = Command::new(field, value)?;
        self.apply_commands(&[command]).await
    }

    /// Write several fields, then re-fetch once.
    pub async fn apply_commands(
        &mut self,
        commands: &[Command],
    ) -> Result<DeviceState, CoreError> {
        if !commands.is_empty() {
            debug!(device = %self.device_id, count = commands.len(), "sending commands");
            if let Err(err) = self.backend.send_commands(commands).await {
                let err = self.observe_failure(err);
                warn!(device = %self.device_id, kind = %err.kind(), error = %err, "command failed");
                return Err(err);
            }
            self.repair.record_success();

            if !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }
        }
        self.refresh().await
    }

    /// Power on, optionally at a speed percentage. `Some(0)` powers off.
    pub async fn turn_on(&mut self, percentage: Option<u8>) -> Result<DeviceState, CoreError> {
        match percentage {
            Some(0) => self.turn_off().await,
            Some(pct) => {
                let speed = Command::new(Field::Speed, i64::from(percentage_to_speed(pct)))?;
                self.apply_commands(&[Command::power(true), speed]).await
            }
            None => self.apply_commands(&[Command::power(true)]).await,
        }
    }

    pub async fn turn_off(&mut self) -> Result<DeviceState, CoreError> {
        self.apply_commands(&[Command::power(false)]).await
    }

    /// Set speed on the 1-100 scale. `0` powers off.
    pub async fn set_percentage(&mut self, percentage: u8) -> Result<DeviceState, CoreError> {
        if percentage == 0 {
            return self.turn_off().await;
        }
        let speed = percentage_to_speed(percentage);
        self.apply_command(Field::Speed, i64::from(speed)).await
    }

    /// Horizontal sweep on (level 1) or off.
    pub async fn set_oscillating(&mut self, on: bool) -> Result<DeviceState, CoreError> {
        self.toggle(Field::HorizontalOscillation, on).await
    }

    pub async fn set_night_mode(&mut self, on: bool) -> Result<DeviceState, CoreError> {
        self.toggle(Field::NightMode, on).await
    }

    /// Mode 1 is "natural wind"; off returns to mode 0.
    pub async fn set_natural_wind(&mut self, on: bool) -> Result<DeviceState, CoreError> {
        self.toggle(Field::Mode, on).await
    }

    pub async fn set_lock(&mut self, on: bool) -> Result<DeviceState, CoreError> {
        self.toggle(Field::Lock, on).await
    }

    async fn toggle(&mut self, field: Field, on: bool) -> Result<DeviceState, CoreError> {
        let command = Command::toggle(field, on)?;
        self.apply_commands(&[command]).await
    }

    // ── Classification ───────────────────────────────────────────

    fn observe_failure(&mut self, err: duux_api::Error) -> CoreError {
        let err = CoreError::from(err);
        if err.is_auth() {
            self.repair.record_auth_failure();
        }
        err
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the coordinator configuration.
fn build_transport(config: &CoordinatorConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        },
        timeout: config.timeout,
    }
}
