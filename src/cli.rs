//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use alexandria_core::MirrorSlot;

/// Find books on a catalog mirror and keep them in a local library.
///
/// Records are catalog volumes in JSON (the shape Google Books returns for a
/// single volume); downloads land in one directory per book under the
/// storage root together with the record as `data.json`.
#[derive(Parser, Debug)]
#[command(name = "alexandria")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Library directory (default: ~/Alexandria)
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_root: Option<PathBuf>,

    /// Catalog mirror base URL (default: http://libgen.is)
    #[arg(long, global = true, value_name = "URL")]
    pub catalog_host: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the catalog and list every scraped row
    Search(SearchArgs),
    /// List catalog files matching a record
    Match(MatchArgs),
    /// Download a matching file for a record into the library
    Download(DownloadArgs),
    /// List books in the library, most recently opened first
    Library(LibraryArgs),
    /// Open a library book (by its `library` listing number)
    Open(OpenArgs),
    /// Open the library directory in the file manager
    OpenDir,
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
    /// Free-text query
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct MatchArgs {
    /// Catalog record JSON file
    pub record: PathBuf,

    /// Order matches by title similarity instead of catalog order
    #[arg(long)]
    pub rank: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct DownloadArgs {
    /// Catalog record JSON file
    pub record: PathBuf,

    /// Which match to download (1 = first)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub pick: u16,

    /// Mirror column to download from (primary or secondary)
    #[arg(long)]
    pub mirror: Option<MirrorSlot>,

    /// Order matches by title similarity before picking
    #[arg(long)]
    pub rank: bool,
}

#[derive(ClapArgs, Debug)]
pub struct LibraryArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct OpenArgs {
    /// Listing number from `alexandria library` (1 = most recent)
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub index: u16,
}
