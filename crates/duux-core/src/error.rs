// ── Core error types ──
//
// Classified errors handed to the host. These are NOT API-specific --
// the host never sees raw HTTP status codes or JSON parse failures.
// The `From<duux_api::Error>` impl folds transport-layer errors into the
// five classes the coordinator reasons about.

use thiserror::Error;

/// Failure class of a [`CoreError`]. Only [`ErrorKind::Auth`] feeds the
/// repair escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    NotFound,
    Protocol,
    Transport,
    Validation,
    Config,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Credential errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Device errors ────────────────────────────────────────────────
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("Unexpected response from the Duux API: {message}")]
    Protocol { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the Duux API: {message}")]
    Transport { message: String },

    #[error("Duux API request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Caller errors ────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationFailed { .. } => ErrorKind::Auth,
            Self::DeviceNotFound { .. } => ErrorKind::NotFound,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Transport { .. } | Self::Timeout { .. } => ErrorKind::Transport,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<duux_api::Error> for CoreError {
    fn from(err: duux_api::Error) -> Self {
        match err {
            duux_api::Error::Authentication { status, message } => {
                CoreError::AuthenticationFailed {
                    message: format!("HTTP {status}: {message}"),
                }
            }
            duux_api::Error::NotFound { device_id } => CoreError::DeviceNotFound { device_id },
            ref e @ duux_api::Error::Http { .. } if e.is_transient() => CoreError::Transport {
                message: e.to_string(),
            },
            duux_api::Error::Http { status, body } => CoreError::Protocol {
                message: format!("HTTP {status}: {body}"),
            },
            duux_api::Error::Transport(e) => CoreError::Transport {
                message: e.to_string(),
            },
            duux_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            duux_api::Error::Deserialization { message, body: _ } => {
                CoreError::Protocol { message }
            }
            e @ (duux_api::Error::Validation { .. }
            | duux_api::Error::UnknownField(_)
            | duux_api::Error::InvalidDeviceId(_)) => CoreError::Validation {
                message: e.to_string(),
            },
            e @ (duux_api::Error::InvalidUrl(_) | duux_api::Error::Tls(_)) => CoreError::Config {
                message: e.to_string(),
            },
        }
    }
}
