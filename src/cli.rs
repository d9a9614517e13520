use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "markify")]
#[command(author, version, about = "Document to Markdown conversion service")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the conversion server and worker pool
    Start {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "20926")]
        port: u16,
    },

    /// Convert a single file locally, without the server
    Convert {
        /// Input document to convert
        #[arg(required = true)]
        input: PathBuf,

        /// Conversion mode (fast, advanced, cloud)
        #[arg(short, long, default_value = "fast")]
        mode: String,

        /// Write the Markdown here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that configured conversion backends are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
