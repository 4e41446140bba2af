//! CLI module for ragchat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// ragchat - chat with your documents
///
/// Index local text and markdown files, then ask questions that are answered from
/// the most relevant passages while remembering earlier turns of the conversation.
#[derive(Parser, Debug)]
#[command(name = "ragchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a text file or a directory of text/markdown files
    Ingest {
        /// File or directory to index
        path: String,

        /// Maximum chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared between consecutive chunks
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        /// User id to attach history to (generated if omitted)
        #[arg(short, long)]
        user: Option<String>,

        /// Session id to continue (generated if omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Show the retrieved passages
        #[arg(long)]
        sources: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// User id to attach history to (generated if omitted)
        #[arg(short, long)]
        user: Option<String>,

        /// Session id to continue (generated if omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Search indexed passages without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show the stored history of a session
    History {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        session: String,

        /// Number of most recent turns to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete the stored history of a session
    Clear {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        session: String,
    },

    /// Show index and chat log status
    Status,

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
