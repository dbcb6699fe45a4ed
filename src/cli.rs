//! Command-line interface definitions for jomics.
//!
//! # Example
//!
//! ```bash
//! # Index a collection and print the folder tree
//! jomics scan ~/Comics
//!
//! # Same, as JSON
//! jomics scan ~/Comics --output json
//!
//! # Keep the index fresh, rescanning every ten minutes
//! jomics watch ~/Comics --interval 600
//!
//! # Extract the first page of an album
//! jomics page ~/Comics 0x1c291ca3 0 -o cover.jpg
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{Overrides, THUMB_HEIGHT_RANGE};
use crate::library;

/// Comic archive collection indexer.
///
/// Walks a directory of .cbz/.cbr archives, titles them from embedded
/// ComicInfo.xml or their file names, and keeps a disk cache of cover
/// thumbnails.
#[derive(Debug, Parser)]
#[command(name = "jomics")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (default: jomics.toml in the platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Thumbnail height in pixels (100-2000)
    #[arg(long, global = true, value_name = "PX", value_parser = parse_thumb_height)]
    pub thumb_height: Option<u32>,

    /// Thumbnail cache directory
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a collection once and print its contents
    Scan(ScanArgs),
    /// Scan a collection and rescan it periodically until interrupted
    Watch(WatchArgs),
    /// Write one page of an album to a file or stdout
    Page(PageArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Collection root (default: `root` from the config)
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the watch subcommand.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Collection root (default: `root` from the config)
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Seconds between rescans (0 disables rescans)
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
}

/// Arguments for the page subcommand.
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Collection root
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Album id, decimal or 0x-prefixed hex
    #[arg(value_name = "ALBUM_ID", value_parser = parse_id_arg)]
    pub album: u32,

    /// Zero-based page index
    #[arg(value_name = "PAGE")]
    pub page: usize,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Indented folder tree
    #[default]
    Text,
    /// JSON array of folder listings
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl Cli {
    /// Config overrides from the global flags plus the subcommand's root.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        let (root, interval) = match &self.command {
            Commands::Scan(args) => (args.root.clone(), None),
            Commands::Watch(args) => (args.root.clone(), args.interval),
            Commands::Page(args) => (Some(args.root.clone()), None),
        };
        Overrides {
            root,
            thumb_height: self.thumb_height,
            rescan_interval_secs: interval,
            cache_dir: self.cache_dir.clone(),
            quiet: self.quiet.then_some(true),
        }
    }
}

/// Parse an album id for clap.
///
/// # Errors
///
/// Returns a message if `s` is neither decimal nor `0x` hex.
pub fn parse_id_arg(s: &str) -> Result<u32, String> {
    library::parse_id(s).ok_or_else(|| format!("Invalid id '{s}': expected decimal or 0x hex"))
}

/// Parse and range-check a thumbnail height for clap.
///
/// # Errors
///
/// Returns a message if `s` is not a number in 100..=2000.
pub fn parse_thumb_height(s: &str) -> Result<u32, String> {
    let height: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid height '{s}'"))?;
    if THUMB_HEIGHT_RANGE.contains(&height) {
        Ok(height)
    } else {
        Err(format!("Height {height} out of range (100-2000)"))
    }
}
