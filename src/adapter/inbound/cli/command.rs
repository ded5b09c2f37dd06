//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Database management for ormkit models
#[derive(Parser, Debug)]
#[command(name = "ormkit")]
#[command(version)]
pub struct Cli {
    /// Database URL [default: config file, then sqlite:///ormkit.db]
    #[arg(long, global = true, value_name = "URL")]
    pub db_url: Option<String>,

    /// Configuration file declaring the managed tables [default: ormkit.toml if present]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create database and tables
    Create,

    /// Drop all tables
    Drop,

    /// Drop and recreate database
    Reset,

    /// Show database information
    Info,

    /// Backup database (SQLite only)
    Backup {
        /// Backup file path [default: <database>.backup]
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Restore database from a backup (SQLite only)
    Restore {
        /// Backup file path to restore from
        path: PathBuf,
    },

    /// Vacuum database (SQLite only)
    Vacuum,
}

impl Commands {
    /// Name of the file-level operation, for commands limited to SQLite.
    pub const fn sqlite_operation(&self) -> Option<&'static str> {
        match self {
            Self::Backup { .. } => Some("Backup"),
            Self::Restore { .. } => Some("Restore"),
            Self::Vacuum => Some("Vacuum"),
            Self::Create | Self::Drop | Self::Reset | Self::Info => None,
        }
    }
}
