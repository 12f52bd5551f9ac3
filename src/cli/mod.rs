pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "resource-fetcher")]
#[command(about = "Fetch remote resources with retries, cancellation and E-Tags", long_about = None)]
pub struct Cli {
    /// Cancel the download after this many milliseconds
    #[arg(short, long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Log every download step
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a URL and print its body
    Get {
        /// URL to download
        url: String,
        /// Keep the URL out of log lines
        #[arg(long)]
        hide_url: bool,
        /// Name used in log lines instead of the URL
        #[arg(long)]
        name: Option<String>,
        /// Exit with an error if the download fails
        #[arg(long)]
        throw: bool,
    },
    /// Download a URL only if its E-Tag changed
    Etag {
        /// URL to download
        url: String,
        /// E-Tag of the cached copy
        #[arg(long)]
        etag: Option<String>,
    },
    /// Print one top-level property of a JSON document
    Property {
        /// URL of the JSON document
        url: String,
        /// Property name
        property: String,
    },
    /// Print a local file
    File {
        /// Path to the file
        path: std::path::PathBuf,
    },
}
