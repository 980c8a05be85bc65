//! Command-line surface: two mutually exclusive run modes plus a required
//! config path.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cdnwatch",
    version,
    about = "CDN route and throughput monitor",
    long_about = "Tracks which CDN a content-delivery domain resolves to and \
                  measures download throughput against the resolved IPs."
)]
pub struct Cli {
    /// Check DNS resolution for the download domain and record the route
    #[arg(short = 's', long = "dns", conflicts_with = "download")]
    pub dns: bool,

    /// Download from each CDN provider, rebuild reports, apply retention
    #[arg(short, long)]
    pub download: bool,

    /// Location of the config file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
