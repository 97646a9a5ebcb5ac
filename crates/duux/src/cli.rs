//! Clap derive structures for the `duux` CLI.
//!
//! Defines the command tree, global flags, and shared value types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use duux_core::{Field, Protocol};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// duux -- control Duux smart fans through the vendor cloud
#[derive(Debug, Parser)]
#[command(
    name = "duux",
    version,
    about = "Control Duux smart fans from the command line",
    long_about = "Reads and writes Duux fan state through the Duux cloud API.\n\n\
        Every write is confirmed by re-reading the fan, and repeated token\n\
        rejections are reported as a repair notice.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Fan profile to use
    #[arg(long, short = 'p', env = "DUUX_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device id, e.g. 34:5f:45:ec:b8:34 (overrides profile)
    #[arg(long, short = 'd', env = "DUUX_DEVICE_ID", global = true)]
    pub device_id: Option<String>,

    /// JWT bearer token (overrides profile and keyring)
    #[arg(long, env = "DUUX_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Cloud API root (overrides profile)
    #[arg(long, env = "DUUX_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Command body format
    #[arg(long, env = "DUUX_PROTOCOL", global = true)]
    pub protocol: Option<ProtocolArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DUUX_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(
        long,
        env = "DUUX_TIMEOUT",
        global = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// Milliseconds to wait between a command and the confirming refresh
    #[arg(long, env = "DUUX_SETTLE_DELAY_MS", global = true)]
    pub settle_delay_ms: Option<u64>,
}

// ── Shared Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// `token=value` lines (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProtocolArg {
    /// `tune set <field> <value>` instructions
    Text,
    /// Legacy `{"<field>": <value>}` objects
    Numeric,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Text => Self::Text,
            ProtocolArg::Numeric => Self::Numeric,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch and show the fan's current state
    #[command(alias = "st")]
    Status,

    /// Write a raw field value (power, speed, horosc, verosc, mode, night, lock)
    Set {
        /// Field name or wire token
        field: Field,

        /// Integer value inside the field's domain
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },

    /// Power the fan on
    On {
        /// Speed on a 1-100 scale (0 powers off)
        #[arg(long, short = 'P', value_parser = clap::value_parser!(u8).range(0..=100))]
        percentage: Option<u8>,
    },

    /// Power the fan off
    Off,

    /// Set speed on a 1-100 scale (0 powers off)
    Speed {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percentage: u8,
    },

    /// Horizontal oscillation on or off
    #[command(alias = "osc")]
    Oscillate { state: Toggle },

    /// Night mode on or off
    Night { state: Toggle },

    /// Natural wind mode on or off
    NaturalWind { state: Toggle },

    /// Child lock on or off
    Lock { state: Toggle },

    /// Poll the fan and print changes until Ctrl-C
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between refreshes (defaults to the profile's poll interval)
    #[arg(long, short = 'i', value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Stop after this many refresh cycles
    #[arg(long, short = 'n')]
    pub count: Option<u32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (tokens masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (device_id, protocol, api_url, timeout, ...)
        key: String,

        /// Value to set
        value: String,
    },

    /// Store a JWT token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },

    /// Print the config file location
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
