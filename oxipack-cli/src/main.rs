//! OxiPack CLI - chunked pack archive tool
//!
//! Creates, lists, extracts and verifies pack archives.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    CreateOptions, ExtractFailed, ExtractOptions, ListOptions, cmd_completions, cmd_create,
    cmd_extract, cmd_info, cmd_list, cmd_test,
};
use oxipack_core::MAX_NAME_LEN;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oxipack")]
#[command(author, version, about = "Chunked pack archive tool")]
#[command(long_about = "
OxiPack bundles many files into a single chunked pack with a CRC-32 per entry.

Examples:
  oxipack create assets.pack models/ textures/
  oxipack create assets.pack models/ --keep-paths
  oxipack list assets.pack -v
  oxipack list assets.pack --json --chunks
  oxipack extract assets.pack -o out/ --verify
  oxipack extract assets.pack ship.obj hull.png
  oxipack test assets.pack
  oxipack info assets.pack
")]
pub(crate) struct Cli {
    /// Verbose output (also enables debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of a pack
    #[command(alias = "l")]
    List {
        /// Pack file to list
        archive: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Also show the chunk chain
        #[arg(short, long)]
        chunks: bool,

        /// Include only entries matching pattern (glob syntax: *.txt)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Extract entries from a pack
    #[command(alias = "x")]
    Extract {
        /// Pack file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Entries to extract (all if empty)
        names: Vec<String>,

        /// Include only entries matching pattern (glob syntax: *.txt)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Check every entry against its CRC-32 while extracting
        #[arg(long)]
        verify: bool,

        /// Overwrite existing files without asking
        #[arg(short, long)]
        force: bool,

        /// Show progress bar
        #[arg(short = 'P', long, default_value = "true")]
        progress: bool,
    },

    /// Verify every entry's checksum
    #[command(alias = "t")]
    Test {
        /// Pack file to test
        archive: PathBuf,
    },

    /// Create a new pack
    #[command(alias = "c")]
    Create {
        /// Output pack file
        archive: PathBuf,

        /// Files and directories to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Store paths relative to each argument instead of bare file names
        #[arg(short, long)]
        keep_paths: bool,

        /// Longest entry name accepted, in bytes
        #[arg(long, default_value_t = MAX_NAME_LEN)]
        max_name_len: usize,

        /// Include only files matching pattern (glob syntax: *.txt)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude files matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Show progress bar
        #[arg(short = 'P', long, default_value = "true")]
        progress: bool,
    },

    /// Show information about a pack
    #[command(alias = "i")]
    Info {
        /// Pack file to inspect
        archive: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::List {
            archive,
            json,
            chunks,
            include,
            exclude,
        } => cmd_list(
            &archive,
            &ListOptions {
                verbose,
                json,
                chunks,
                include: &include,
                exclude: &exclude,
            },
        ),
        Commands::Extract {
            archive,
            output,
            names,
            include,
            exclude,
            verify,
            force,
            progress,
        } => cmd_extract(
            &archive,
            &output,
            &names,
            &ExtractOptions {
                include: &include,
                exclude: &exclude,
                verify,
                force,
                verbose,
                progress,
            },
        ),
        Commands::Test { archive } => cmd_test(&archive, verbose),
        Commands::Create {
            archive,
            paths,
            keep_paths,
            max_name_len,
            include,
            exclude,
            progress,
        } => cmd_create(
            &archive,
            &paths,
            &CreateOptions {
                keep_paths,
                max_name_len,
                include: &include,
                exclude: &exclude,
                verbose,
                progress,
            },
        ),
        Commands::Info { archive } => cmd_info(&archive),
        Commands::Completions { shell } => cmd_completions(shell),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

/// Checksum failures exit with 2, like `oxipack test`; anything else with 1.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    if err.is::<ExtractFailed>() { 2 } else { 1 }
}
