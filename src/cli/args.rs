//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "primitive")]
#[command(author, version, about = "Query and reshape JSON data with pipelines", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Output format as JSON
    #[arg(long, global = true, env = "PRIMITIVE_JSON")]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Load a source and run a pipeline against it
    Query {
        /// File path or inline JSON object/array
        source: String,

        /// Stages separated by '|', e.g. "where k=2 | keys"
        pipeline: Option<String>,

        /// Write the resulting container to this path
        #[arg(long)]
        out: Option<PathBuf>,

        /// Pretty-print the file written with --out
        #[arg(long)]
        pretty: bool,
    },

    /// Print the encoded form of a source
    Encrypt {
        /// File path or inline JSON object/array
        source: String,
    },

    /// Decode a payload produced by `encrypt`
    Decrypt {
        payload: String,
    },

    /// Re-save any readable source as JSON
    Convert {
        /// File path or inline JSON object/array
        source: String,

        /// Destination path
        out: PathBuf,

        #[arg(long)]
        pretty: bool,
    },

    /// Start interactive REPL mode
    Repl {
        /// Optional starting data
        source: Option<String>,
    },
}
