//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// RPA Workflow Generator - Turn screen recordings into editable RPA commands
#[derive(Parser, Debug)]
#[command(name = "rpa-gen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate workflow commands from a recorded session
    Generate {
        /// Recorded screen video (mp4, mov, or avi)
        #[arg(long)]
        video: PathBuf,

        /// Interaction log JSON captured alongside the video
        #[arg(long)]
        log: PathBuf,

        /// Output file path (defaults to a timestamped name in the output dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Workflow name used in the default output file name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Validate a session pair without calling the model
    Validate {
        /// Recorded screen video
        #[arg(long)]
        video: PathBuf,

        /// Interaction log JSON
        #[arg(long)]
        log: PathBuf,

        /// Video duration override in seconds (defaults to the log's duration)
        #[arg(short, long)]
        duration: Option<f64>,
    },

    /// List recorded sessions in the records directory
    List {
        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
}

/// A video and its matching interaction log found in the records directory
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPair {
    pub video: PathBuf,
    /// Matching `<stem>_interactions.json`, when present
    pub log: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Scan a records directory for videos and their `_interactions.json` partners.
pub fn discover_sessions(records_dir: &Path) -> std::io::Result<Vec<SessionPair>> {
    let mut pairs = Vec::new();
    for entry in std::fs::read_dir(records_dir)? {
        let path = entry?.path();
        let is_video = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "mp4" | "mov" | "avi"))
            .unwrap_or(false);
        if !is_video {
            continue;
        }
        let log = path
            .file_stem()
            .map(|stem| path.with_file_name(format!("{}_interactions.json", stem.to_string_lossy())))
            .filter(|p| p.exists());
        pairs.push(SessionPair { video: path, log });
    }
    pairs.sort_by(|a, b| a.video.cmp(&b.video));
    Ok(pairs)
}
