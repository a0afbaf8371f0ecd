pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "marketplace")]
#[command(about = "Marketplace product and token query service")]
pub struct Args {
    /// API server to talk to (defaults to the configured api_port on localhost)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the marketplace config directory (defaults to ~/.marketplace)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
