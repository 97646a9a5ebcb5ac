// ── Runtime coordinator configuration ──
//
// These types describe *how* to reach one fan. They carry credential data
// and cadence tuning, but never touch disk. The host constructs a
// `CoordinatorConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use duux_api::{Credentials, DEFAULT_API_URL, Protocol};
use url::Url;

/// Reference polling cadence. The host's scheduler owns the timer.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Pause between a successful command write and the re-fetch, giving the
/// fan time to apply the change.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Per-request network timeout.
pub const DEFAULT_TIMEOUT: Duration = duux_api::transport::DEFAULT_TIMEOUT;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled webpki roots (strict).
    #[default]
    SystemDefaults,
    /// Trust an additional CA certificate file (e.g. an inspecting proxy).
    CustomCa(PathBuf),
}

/// Configuration for one coordinator.
///
/// Built by the host, passed to [`Coordinator`](crate::Coordinator) --
/// core never reads config files, environment or keyrings.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Device id + bearer token.
    pub credentials: Credentials,
    /// API root (defaults to the vendor cloud).
    pub api_url: Url,
    /// Command body format.
    pub protocol: Protocol,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout. Always bounded.
    pub timeout: Duration,
    /// Interval the host should call `refresh()` at.
    pub poll_interval: Duration,
    /// Delay between a command write and the confirming re-fetch.
    pub settle_delay: Duration,
}

impl CoordinatorConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            api_url: default_api_url(),
            protocol: Protocol::default(),
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

pub fn default_api_url() -> Url {
    // Constant input; parsing cannot fail.
    Url::parse(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!("DEFAULT_API_URL is valid"))
}
