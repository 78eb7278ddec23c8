use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "castscribe",
    about = "castscribe - Archive every transcript of a YouTube channel and mirror it to object storage",
    version,
    long_about = "Harvests the transcripts of all videos on a YouTube channel into numbered text files, and separately uploads those files to an S3-compatible bucket such as DigitalOcean Spaces."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the transcript of every channel video into numbered files
    Harvest {
        /// YouTube Data API key
        #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Channel handle to archive (overrides the config file)
        #[arg(short, long, value_name = "HANDLE")]
        channel: Option<String>,

        /// Directory to write transcripts to (overrides the config file)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Caption language codes in order of preference (overrides the config file)
        #[arg(short, long = "language", value_name = "LANG")]
        languages: Vec<String>,
    },

    /// Upload transcript files to the configured bucket
    Sync {
        /// Directory to upload from (defaults to the harvest output directory)
        #[arg(short, long, value_name = "DIR")]
        input_dir: Option<PathBuf>,

        /// Bucket key prefix (overrides the config file)
        #[arg(short, long, value_name = "PREFIX")]
        prefix: Option<String>,

        /// Exit with a failure status when any upload fails
        #[arg(long)]
        fail_on_error: bool,
    },

    /// Show or initialise the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default config.yaml into the current directory
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },
}
