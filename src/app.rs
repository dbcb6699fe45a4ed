//! Command dispatch for the `jomics` binary.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bytesize::ByteSize;

use crate::cli::{Cli, Commands, OutputFormat, PageArgs};
use crate::config::Settings;
use crate::error::ExitCode;
use crate::index::{CollectionIndex, ItemKind, Listing};
use crate::library::{self, LibraryError};
use crate::logging::init_logging;
use crate::manager::IndexManager;
use crate::progress::Progress;
use crate::scanner::CollectionScanner;
use crate::signal::install_handler;
use crate::thumbnail::ThumbnailCache;

/// How often `watch` checks for Ctrl+C while idle.
const WATCH_TICK: Duration = Duration::from_secs(1);

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the root cannot be
/// scanned, or the requested page cannot be read.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;
    let (verbose, quiet) = log_flags(&cli, &settings);
    init_logging(verbose, quiet);
    let scanner = build_scanner(&settings)?;
    let root = settings.root()?;

    match cli.command {
        Commands::Scan(ref args) => {
            let index = scanner
                .scan(root)
                .with_context(|| format!("Failed to scan {}", root.display()))?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            match args.output {
                OutputFormat::Text => write_tree(&index, &mut out)?,
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(&mut out, &all_listings(&index))?;
                    writeln!(out)?;
                }
            }
            Ok(ExitCode::Success)
        }
        Commands::Watch(_) => watch(scanner, root, &settings),
        Commands::Page(ref args) => {
            let path = scanner
                .locate(root, args.album)
                .with_context(|| format!("Failed to scan {}", root.display()))?
                .ok_or(LibraryError::AlbumNotFound(args.album))?;
            write_page(&path, args)?;
            Ok(ExitCode::Success)
        }
    }
}

/// Verbosity for the logger. `quiet` may come from the config file or the
/// environment; an explicit `-v` still wins over it.
fn log_flags(cli: &Cli, settings: &Settings) -> (u8, bool) {
    (cli.verbose, settings.quiet && cli.verbose == 0)
}

fn build_scanner(settings: &Settings) -> Result<CollectionScanner> {
    let cache_dir = settings.cache_dir()?;
    let cache = ThumbnailCache::new(&cache_dir, settings.thumb_height)
        .with_context(|| format!("Failed to open thumbnail cache {}", cache_dir.display()))?;
    let scanner = CollectionScanner::new(settings.scanner_config(), cache);
    Ok(if settings.quiet {
        scanner
    } else {
        scanner.with_progress(Arc::new(Progress::new(false)))
    })
}

fn watch(scanner: CollectionScanner, root: &Path, settings: &Settings) -> Result<ExitCode> {
    let shutdown = install_handler()?;
    let manager = Arc::new(
        IndexManager::start(scanner, root)
            .with_context(|| format!("Failed to scan {}", root.display()))?,
    );

    let index = manager.current();
    log::info!(
        "Watching {} ({} entries, rescan every {:?})",
        root.display(),
        index.len(),
        settings.rescan_interval()
    );
    drop(index);

    let rescans = manager.spawn_periodic(settings.rescan_interval(), shutdown.clone());
    while shutdown.sleep(WATCH_TICK) {}
    rescans.join();

    log::info!("Stopped after {} scans", manager.generation());
    Ok(ExitCode::Interrupted)
}

fn write_page(path: &Path, args: &PageArgs) -> Result<()> {
    let data = library::read_page_at(path, args.album, args.page)
        .with_context(|| format!("Cannot read page {} of album {:#010x}", args.page, args.album))?;

    match args.output {
        Some(ref path) => std::fs::write(path, &data)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(&data)?;
            out.flush()?;
        }
    }
    log::info!("Wrote {} page {}", ByteSize::b(data.len() as u64), args.page);
    Ok(())
}

/// Listings of the root and every folder, depth first in walk order.
#[must_use]
pub fn all_listings(index: &CollectionIndex) -> Vec<Listing> {
    let mut listings = Vec::new();
    collect_listings(index, None, &mut listings);
    listings
}

fn collect_listings(index: &CollectionIndex, folder: Option<u32>, out: &mut Vec<Listing>) {
    let listing = index.listing(folder);
    let subfolders: Vec<u32> = listing
        .items
        .iter()
        .filter(|item| item.kind == ItemKind::Folder)
        .map(|item| item.id)
        .collect();
    out.push(listing);
    for id in subfolders {
        collect_listings(index, Some(id), out);
    }
}

/// Print the collection as an indented tree.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_tree<W: Write>(index: &CollectionIndex, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{}", index.root().display())?;
    write_folder(index, None, 1, out)?;

    let albums = index.entries().filter(|e| !e.is_container).count();
    let missing = index
        .entries()
        .filter(|e| !e.is_container && !e.has_cover())
        .count();
    writeln!(
        out,
        "{} albums, {} folders, {} without cover",
        albums,
        index.directory_ids().len(),
        missing
    )?;
    if index.collisions() > 0 {
        writeln!(out, "{} id collisions", index.collisions())?;
    }
    Ok(())
}

fn write_folder<W: Write>(
    index: &CollectionIndex,
    folder: Option<u32>,
    depth: usize,
    out: &mut W,
) -> std::io::Result<()> {
    let indent = "  ".repeat(depth);
    for item in index.listing(folder).items {
        match item.kind {
            ItemKind::Folder => {
                writeln!(out, "{indent}{:#010x} {}/", item.id, item.title)?;
                write_folder(index, Some(item.id), depth + 1, out)?;
            }
            ItemKind::Album => {
                let cover = index
                    .cover(item.cover_id)
                    .map_or_else(|| "no cover".to_string(), |c| ByteSize::b(c.len() as u64).to_string());
                writeln!(
                    out,
                    "{indent}{:#010x} {} ({} pages, {})",
                    item.id, item.title, item.pages, cover
                )?;
            }
        }
    }
    Ok(())
}
