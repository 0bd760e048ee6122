//! CLI module for AEGIS
//!
//! Provides command-line interface parsing and handling for the
//! aegis-server binary. Uses clap for argument parsing and owo-colors
//! for colored terminal output.

pub mod chat;
pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A.E.G.I.S - Agentic Enrollment Guidance & Intake Server
#[derive(Parser, Debug)]
#[command(
    name = "aegis-server",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "A.E.G.I.S - Agentic Enrollment Guidance & Intake Server",
    long_about = "A multi-agent health-insurance intake pipeline: a remote intake agent behind a\n\
                  task protocol server, a risk profiler, a plan recommender grounded in a\n\
                  retrieval index, and an orchestrator routing each conversation through them.",
    after_help = "EXAMPLES:\n    \
                  aegis-server init             # Scaffold config, form schema and plan docs\n    \
                  aegis-server ingest           # Build the plan retrieval index\n    \
                  aegis-server agent            # Start the task protocol server\n    \
                  aegis-server retrieval        # Start the plan retrieval server\n    \
                  aegis-server chat             # Talk to the pipeline from the terminal\n    \
                  aegis-server --config my.toml agent"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "aegis.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new AEGIS deployment
    ///
    /// Creates aegis.toml, the intake form schema and starter plan
    /// documents for the retrieval index.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,

        /// LLM provider to configure (ollama or openai)
        #[arg(long, default_value = "ollama")]
        provider: String,
    },

    /// Start the task protocol server hosting the intake agent
    Agent {
        /// Bind host (overrides the configuration file)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides the configuration file)
        #[arg(long)]
        port: Option<u16>,

        /// Public base URL advertised in the agent card
        #[arg(long)]
        public_url: Option<String>,
    },

    /// Start the plan retrieval server
    Retrieval {
        /// Bind host (overrides the configuration file)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides the configuration file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Chunk, embed and index the plan documents
    Ingest {
        /// Directory of plan documents (.md / .txt)
        #[arg(default_value = "data/plans")]
        dir: PathBuf,
    },

    /// Talk to the full pipeline from the terminal
    Chat {
        /// Resume a conversation by id instead of starting a new one
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,
    },

    /// Serve plan retrieval over the Model Context Protocol (stdio)
    #[cfg(feature = "mcp")]
    Mcp,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
