//! CLI configuration -- thin wrapper around `duux_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--device-id, --token, --api-url, ...).

use secrecy::SecretString;

use duux_core::CoordinatorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use duux_config::{Config, Profile, config_path, load_config, save_config, store_token};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build a `CoordinatorConfig` from the config file, profile, and CLI overrides.
///
/// Flags win over profile values. Without a stored profile, `--device-id`
/// plus a token source is enough.
pub fn build_coordinator_config(global: &GlobalOpts) -> Result<CoordinatorConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let profile = match (cfg.profiles.get(&profile_name), &global.device_id) {
        (Some(profile), _) => profile.clone(),
        (None, Some(device_id)) => Profile::new(device_id.clone()),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    resolve_profile(profile, &profile_name, &cfg.defaults, global)
}

/// Apply global flag overrides to `profile`, then translate it with
/// [`duux_config::profile_to_coordinator_config`].
pub fn resolve_profile(
    mut profile: Profile,
    profile_name: &str,
    defaults: &duux_config::Defaults,
    global: &GlobalOpts,
) -> Result<CoordinatorConfig, CliError> {
    if let Some(ref device_id) = global.device_id {
        profile.device_id.clone_from(device_id);
    }
    if let Some(ref api_url) = global.api_url {
        profile.api_url = Some(api_url.clone());
    }
    if let Some(protocol) = global.protocol {
        profile.protocol = protocol.into();
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if let Some(settle_delay_ms) = global.settle_delay_ms {
        profile.settle_delay_ms = Some(settle_delay_ms);
    }

    let token = global.token.clone().map(SecretString::from);
    Ok(duux_config::profile_to_coordinator_config(
        &profile,
        profile_name,
        defaults,
        token,
    )?)
}
