//! Shared configuration for Duux fan tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `duux_core::CoordinatorConfig`. The CLI adds
//! `GlobalOpts`-aware overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use duux_core::config::{DEFAULT_SETTLE_DELAY, default_api_url};
use duux_core::{CoordinatorConfig, Credentials, DeviceId, Protocol, TlsVerification};

/// Service name for system keyring entries.
pub const KEYRING_SERVICE: &str = "duux";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no JWT token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named fan profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between refreshes in `watch`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    duux_core::config::DEFAULT_TIMEOUT.as_secs()
}
fn default_poll_interval() -> u64 {
    duux_core::config::DEFAULT_POLL_INTERVAL.as_secs()
}

/// A named fan profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// MAC-formatted device id (e.g., "34:5f:45:ec:b8:34").
    pub device_id: String,

    /// Command body format: "text" or "numeric".
    #[serde(default)]
    pub protocol: Protocol,

    /// JWT token (plaintext -- prefer keyring or env var).
    pub jwt_token: Option<String>,

    /// Environment variable name containing the JWT token.
    pub jwt_token_env: Option<String>,

    /// Override the cloud API root.
    pub api_url: Option<String>,

    /// Path to an extra CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval: Option<u64>,

    /// Pause between a command and the confirming refresh.
    pub settle_delay_ms: Option<u64>,
}

impl Profile {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            protocol: Protocol::default(),
            jwt_token: None,
            jwt_token_env: None,
            api_url: None,
            ca_cert: None,
            timeout: None,
            poll_interval: None,
            settle_delay_ms: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "duux", "duux").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("duux");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
///
/// A missing file yields defaults; a malformed one is an error, so write
/// paths never overwrite profiles they failed to read.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. `DUUX_` variables overlay the file, with
/// `__` separating nesting levels (`DUUX_DEFAULTS__TIMEOUT=5`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DUUX_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/jwt-token"))
}

/// Resolve a JWT token from the credential chain (no CLI flag step).
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's jwt_token_env → env var lookup
    if let Some(ref env_name) = profile.jwt_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.jwt_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a JWT token in the system keyring for `profile_name`.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Parse and normalise a profile's device id.
pub fn parse_device_id(raw: &str) -> Result<DeviceId, ConfigError> {
    DeviceId::new(raw).map_err(|e| ConfigError::Validation {
        field: "device_id".into(),
        reason: e.to_string(),
    })
}

/// Parse an API root, falling back to the vendor cloud.
pub fn parse_api_url(raw: Option<&str>) -> Result<url::Url, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default_api_url());
    };
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Reject zero for settings that must stay bounded and positive
/// (`timeout`, `poll_interval`).
pub fn require_nonzero(field: &str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(value)
}

/// Build a `CoordinatorConfig` from a profile.
///
/// `jwt_token` short-circuits the credential chain (the CLI's `--token`);
/// when `None` the token comes from [`resolve_token`]. Callers apply any
/// other overrides to the profile before translating it.
pub fn profile_to_coordinator_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    jwt_token: Option<SecretString>,
) -> Result<CoordinatorConfig, ConfigError> {
    let device_id = parse_device_id(&profile.device_id)?;
    let api_url = parse_api_url(profile.api_url.as_deref())?;
    let timeout = require_nonzero("timeout", profile.timeout.unwrap_or(defaults.timeout))?;
    let poll_interval = require_nonzero(
        "poll_interval",
        profile.poll_interval.unwrap_or(defaults.poll_interval),
    )?;

    let jwt_token = match jwt_token {
        Some(token) => token,
        None => resolve_token(profile, profile_name)?,
    };

    let mut config = CoordinatorConfig::new(Credentials {
        device_id,
        jwt_token,
    });
    config.api_url = api_url;
    config.protocol = profile.protocol;
    if let Some(ref ca_path) = profile.ca_cert {
        config.tls = TlsVerification::CustomCa(ca_path.clone());
    }
    config.timeout = Duration::from_secs(timeout);
    config.poll_interval = Duration::from_secs(poll_interval);
    config.settle_delay = profile
        .settle_delay_ms
        .map_or(DEFAULT_SETTLE_DELAY, Duration::from_millis);

    Ok(config)
}
