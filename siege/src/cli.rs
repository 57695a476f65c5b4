use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "sg",
    author,
    version,
    about = "A commandline tool to run siege tests",
    after_help = "Examples:\n  sg run -c siege.json\n  sg run -c siege.json --duration 30 --max-concurrent 50\n  sg run -c siege.json -r 200"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the siege test with the provided configuration
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the configuration file
    #[arg(short = 'c', long)]
    pub config: PathBuf,

    /// Maximum requests per second
    #[arg(short = 'r', long = "max-rps")]
    pub max_rps: Option<u64>,

    /// Maximum number of concurrent requests
    #[arg(short = 'm', long = "max-concurrent")]
    pub max_concurrent: Option<usize>,

    /// Duration of the siege in seconds
    #[arg(short = 'd', long)]
    pub duration: Option<u64>,
}
