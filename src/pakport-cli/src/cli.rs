//! CLI argument definitions for pakport

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pakport")]
#[command(about = "Export packaged game archives into a browsable project tree", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export every resource of a game into an export directory
    #[command(visible_alias = "x")]
    Export {
        /// Game files (an extracted disc root) to stage and export
        source: PathBuf,

        /// Export directory
        #[arg(short, long)]
        output: PathBuf,

        /// Worker threads (uses configured default, then all cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Also keep each resource's stored bytes under the raw directory
        #[arg(long)]
        keep_raw: bool,
    },

    /// List the contents of a single archive
    #[command(visible_alias = "l")]
    List {
        /// Path to .pak file
        pak: PathBuf,

        /// Only show resources of this type (e.g. TXTR)
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },

    /// Print or save one resource of an export
    Cat {
        /// Export directory
        export: PathBuf,

        /// Resource ID (hex, optional 0x prefix)
        id: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output the bytes as stored in the archive
        #[arg(long)]
        raw: bool,
    },

    /// Show where a resource lives in an export
    Resolve {
        /// Export directory
        export: PathBuf,

        /// Resource ID (hex, optional 0x prefix)
        id: String,
    },

    /// Rename a resource in an export
    Rename {
        /// Export directory
        export: PathBuf,

        /// Resource ID (hex, optional 0x prefix)
        id: String,

        /// New file name, without extension
        name: String,
    },

    /// Build an archive from a directory of `<ID>[_name].<type>` files
    Pack {
        /// Directory with resource files
        input: PathBuf,

        /// Output .pak file
        #[arg(short, long)]
        output: PathBuf,

        /// Store resources zlib-compressed
        #[arg(short, long)]
        compress: bool,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Default worker thread count (0 = all cores)
        #[arg(long)]
        threads: Option<usize>,

        /// Keep raw stored bytes by default
        #[arg(long)]
        keep_raw: Option<bool>,

        /// Type code that marks an archive as a world archive
        #[arg(long)]
        world_type: Option<String>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
