//! Command-line arguments for `tcfg`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tcfg_model::Confidence;

#[derive(Parser)]
#[command(
    name = "tcfg",
    version,
    about = "Resolve tenant configuration and audit table mappings",
    long_about = "Resolve a tenant's canonical configuration from a store dump, \
                  list the curated mapping rules, or classify a table catalogue \
                  by mapping confidence."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Engine settings file (TOML). Missing files fall back to defaults.
    #[arg(long = "settings", value_name = "PATH", global = true)]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve one tenant's configuration tree from a store dump.
    Resolve(ResolveArgs),

    /// Classify a table catalogue by mapping confidence.
    Report(ReportArgs),

    /// List the curated mapping rules.
    Mappings(MappingsArgs),
}

#[derive(Parser)]
pub struct ResolveArgs {
    /// Tenant identifier.
    #[arg(value_name = "TENANT")]
    pub tenant: String,

    /// JSON store dump with `documents`, `tables` and `flags`.
    #[arg(long = "fixture", value_name = "PATH")]
    pub fixture: PathBuf,

    /// Print only the value at this dot path.
    #[arg(long = "path", value_name = "DOT.PATH")]
    pub path: Option<String>,

    /// Print resolution counters to stderr.
    #[arg(long = "stats")]
    pub stats: bool,
}

#[derive(Parser)]
pub struct ReportArgs {
    /// JSON list of `{table_name, columns}` entries.
    #[arg(value_name = "CATALOGUE")]
    pub catalogue: PathBuf,

    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Parser)]
pub struct MappingsArgs {
    /// Only rules of this confidence tier.
    #[arg(long = "confidence", value_enum)]
    pub confidence: Option<ConfidenceArg>,

    /// Only rules reading this table.
    #[arg(long = "table", value_name = "TABLE")]
    pub table: Option<String>,

    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ConfidenceArg {
    High,
    Medium,
    Low,
}

impl From<ConfidenceArg> for Confidence {
    fn from(value: ConfidenceArg) -> Self {
        match value {
            ConfidenceArg::High => Confidence::High,
            ConfidenceArg::Medium => Confidence::Medium,
            ConfidenceArg::Low => Confidence::Low,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
