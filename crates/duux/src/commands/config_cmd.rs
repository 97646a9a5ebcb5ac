//! Config subcommand handlers.

use dialoguer::{Input, Select};

use duux_core::Protocol;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_number(field: &str, value: &str) -> Result<u64, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be a whole number, got '{value}'"),
    })
}

fn prompt_token() -> Result<String, CliError> {
    let token = rpassword::prompt_password("JWT token: ").map_err(prompt_err)?;
    let token = token.trim().to_owned();
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "jwt_token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),
        ConfigCommand::Show => show(global),
        ConfigCommand::Set { key, value } => set(&key, value, global),
        ConfigCommand::SetToken { profile } => set_token(profile, global),
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    let mut cfg = config::load_config()?;
    eprintln!("Duux fan -- configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Device id, validated up front
    let device_id: String = Input::new()
        .with_prompt("Device id (MAC address shown in the Duux app)")
        .validate_with(|input: &String| -> Result<(), String> {
            duux_config::parse_device_id(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;
    let device_id = duux_config::parse_device_id(&device_id)?;

    // 3. Wire format
    let protocol_choices = &["text (current firmware)", "numeric (legacy firmware)"];
    let protocol = match Select::new()
        .with_prompt("Command format")
        .items(protocol_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?
    {
        0 => Protocol::Text,
        _ => Protocol::Numeric,
    };

    // 4. Token + storage location
    let token = prompt_token()?;
    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the token?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let mut profile = Profile::new(device_id.to_string());
    profile.protocol = protocol;
    if store_selection == 0 {
        config::store_token(&profile_name, &token)?;
        eprintln!("   Token stored in system keyring");
    } else {
        profile.jwt_token = Some(token);
    }

    // 5. Merge into the existing config and write
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\nConfiguration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: duux status");
    Ok(())
}

// ── Show ────────────────────────────────────────────────────────────

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config()?;
    for profile in cfg.profiles.values_mut() {
        if profile.jwt_token.is_some() {
            profile.jwt_token = Some("********".into());
        }
    }

    let out = match global.output {
        OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
        OutputFormat::JsonCompact => serde_json::to_string(&cfg)?,
        OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)
            .map_err(|e| CliError::Config(Box::new(e.into())))?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Set <key> <value> ───────────────────────────────────────────────

fn set(key: &str, value: String, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config()?;
    let profile_name = config::active_profile_name(global, &cfg);

    let profile = cfg
        .profiles
        .entry(profile_name.clone())
        .or_insert_with(|| Profile::new(String::new()));

    match key {
        "device_id" | "device-id" => {
            profile.device_id = duux_config::parse_device_id(&value)?.to_string();
        }
        "protocol" => {
            profile.protocol = value.parse().map_err(|_| CliError::Validation {
                field: "protocol".into(),
                reason: "must be 'text' or 'numeric'".into(),
            })?;
        }
        "api_url" | "api-url" => {
            duux_config::parse_api_url(Some(&value))?;
            profile.api_url = Some(value);
        }
        "jwt_token" | "jwt-token" => profile.jwt_token = Some(value),
        "jwt_token_env" | "jwt-token-env" => profile.jwt_token_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "timeout" => {
            let secs = parse_number("timeout", &value)?;
            profile.timeout = Some(duux_config::require_nonzero("timeout", secs)?);
        }
        "poll_interval" | "poll-interval" => {
            let secs = parse_number("poll_interval", &value)?;
            profile.poll_interval = Some(duux_config::require_nonzero("poll_interval", secs)?);
        }
        "settle_delay_ms" | "settle-delay-ms" => {
            profile.settle_delay_ms = Some(parse_number("settle_delay_ms", &value)?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: device_id, protocol, api_url, \
                     jwt_token, jwt_token_env, ca_cert, timeout, poll_interval, settle_delay_ms"
                ),
            });
        }
    }

    config::save_config(&cfg)?;
    eprintln!("Set {key} on profile '{profile_name}'");
    Ok(())
}

// ── SetToken ────────────────────────────────────────────────────────

fn set_token(profile: Option<String>, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config()?;
    let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

    if !cfg.profiles.contains_key(&profile_name) {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: config::available_profiles(&cfg),
        });
    }

    let token = prompt_token()?;
    config::store_token(&profile_name, &token)?;

    eprintln!("Token stored in system keyring for profile '{profile_name}'");
    Ok(())
}
