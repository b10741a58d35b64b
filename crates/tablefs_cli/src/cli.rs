//! Command-line definitions

use crate::config::AppConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// tablefs - a filesystem stored in one SQLite table
#[derive(Parser, Debug)]
#[command(name = "tablefs", version)]
#[command(about = "Store and browse files kept as rows of a SQLite table")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Table holding the entries
    #[arg(long)]
    pub table: Option<String>,

    /// Root prefix applied to every path
    #[arg(long)]
    pub prefix: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Write a file, creating missing parent directories
    Write {
        path: String,
        #[command(flatten)]
        source: ContentSource,
        /// Store the file as private
        #[arg(long)]
        private: bool,
        /// Last-modified time as a Unix timestamp (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
    },
    /// Print a file's contents
    Read { path: String },
    /// List a directory
    Ls {
        #[arg(default_value = "")]
        path: String,
        /// Include all descendants
        #[arg(long, short)]
        recursive: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Only list files
        #[arg(long, conflicts_with = "dirs")]
        files: bool,
        /// Only list directories
        #[arg(long)]
        dirs: bool,
    },
    /// Delete a file
    Rm { path: String },
    /// Delete a directory and everything under it
    Rmdir { path: String },
    /// Create a directory and its parents
    Mkdir { path: String },
    /// Move a file
    Mv { source: String, destination: String },
    /// Copy a file
    Cp { source: String, destination: String },
    /// Show a file's metadata
    Stat {
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Show or set visibility (public, private)
    Visibility { path: String, value: Option<String> },
    /// Print the effective configuration
    Config {
        /// Write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

/// Where `write` takes its bytes from; exactly one is required
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct ContentSource {
    /// Read contents from a local file
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Read contents from stdin
    #[arg(long)]
    pub stdin: bool,
    /// Use the given text as contents
    #[arg(long)]
    pub text: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(database) = &self.database {
            config.database.path = Some(database.clone());
        }
        if let Some(table) = &self.table {
            config.database.table = table.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.database.prefix = prefix.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
