use thiserror::Error;

/// Top-level error type for the `duux-api` crate.
///
/// Covers every failure mode of a single status read or command write:
/// authentication, transport, payload shape, and caller-side validation.
/// `duux-core` folds these into the coordinator's error classes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Bearer token rejected (HTTP 401/403). Expired or revoked JWT.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    // ── Device ──────────────────────────────────────────────────────
    /// The vendor does not know this device (HTTP 404).
    #[error("Device {device_id} not found")]
    NotFound { device_id: String },

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// Response body did not match the expected schema, with the raw body
    /// for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Caller input ────────────────────────────────────────────────
    /// A command value outside the field's domain. Raised before any
    /// request is built.
    #[error("Invalid value {value} for {field}: expected {min}..={max}")]
    Validation {
        field: &'static str,
        value: i64,
        min: u8,
        max: u8,
    },

    /// Unrecognised command field name.
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    /// Device identifier is not a colon-separated MAC address.
    #[error("Invalid device id '{0}': expected a MAC address like 34:5f:45:ec:b8:34")]
    InvalidDeviceId(String),
}

impl Error {
    /// Returns `true` if the vendor rejected the bearer token.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying on the
    /// next poll cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if the caller supplied input that never reached the
    /// network.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::UnknownField(_) | Self::InvalidDeviceId(_)
        )
    }
}
