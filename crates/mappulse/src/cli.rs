//! Clap derive structures for the `mappulse` CLI.
//!
//! Defines the command tree, global flags, and shared argument groups.
//! Also compiled by `build.rs` for man pages, so it depends on clap only.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mappulse -- live GPS fleet positions from the command line
#[derive(Debug, Parser)]
#[command(
    name = "mappulse",
    version,
    about = "Poll a GPS fleet tracker for live device positions",
    long_about = "Fetches the latest point of every device on a OneStep GPS account,\n\
        once or continuously, and prints positions, drive status and battery\n\
        voltages as tables or structured data.",
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
    /// Config profile to use
    #[arg(long, short = 'p', env = "MAPPULSE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device endpoint URL (overrides profile)
    #[arg(long, env = "MAPPULSE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Tracker API key
    #[arg(long, env = "MAPPULSE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MAPPULSE_OUTPUT",
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

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "MAPPULSE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one device id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest point of every device once
    #[command(alias = "ls")]
    Fetch(FetchArgs),

    /// Poll continuously and print throttled updates
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Device view arguments ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Payload order
    #[default]
    None,
    /// Highest altitude first
    Altitude,
    /// Fastest first
    Speed,
    /// Alphabetical by drive status
    Status,
}

/// Sort, hide and search options shared by `fetch` and `watch`.
#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Sort order
    #[arg(long, short = 's', default_value = "none")]
    pub sort: SortKey,

    /// Device ids to hide (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub hide: Vec<String>,

    /// Include hidden devices anyway
    #[arg(long)]
    pub show_hidden: bool,

    /// Case-insensitive filter on device name
    #[arg(long, short = 'f')]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Seconds between polls (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Exit after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file with one profile
    ///
    /// Uses --profile, --base-url and --api-key when given. A key passed
    /// with --api-key goes to the system keyring, never the file.
    Init {
        /// Environment variable the profile reads its API key from
        #[arg(long)]
        api_key_env: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file path
    Path,

    /// Display the loaded configuration (API keys masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Key: base_url, api_key, api_key_env, ca_cert, poll_interval_secs, timeout
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the API key (from --api-key or stdin) in the system keyring
    SetKey,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
