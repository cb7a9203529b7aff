//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Resolve, normalize and re-split cross-referencing XML table-of-contents trees
#[derive(Parser, Debug)]
#[command(name = "tipitree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inline all referenced documents into one file
    Merge {
        /// Top-level table of contents
        #[arg(value_hint = ValueHint::FilePath)]
        src: PathBuf,
        /// Output file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
    },

    /// Resolve, normalize chapters and write a forest of index and chapter files
    Split {
        /// Top-level table of contents
        #[arg(value_hint = ValueHint::FilePath)]
        src: PathBuf,
        /// Output directory
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
    },

    /// Restructure a single raw book document
    Clean {
        /// Book document
        #[arg(value_hint = ValueHint::FilePath)]
        src: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },

    /// Show the resolved table of contents as a tree
    Outline {
        /// Top-level table of contents
        #[arg(value_hint = ValueHint::FilePath)]
        src: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Target file (default: global config)
        #[arg(value_hint = ValueHint::FilePath)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
