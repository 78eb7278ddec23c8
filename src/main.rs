use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use castscribe::config::YOUTUBE_API_KEY_VAR;
use castscribe::{
    Cli, Commands, Config, HarvestPipeline, Result, S3Store, StoreSettings, SyncPipeline,
    YoutubeCatalog, YoutubeTranscripts,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Environment files are read before parsing so clap's `env` lookups see them.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "castscribe=debug" } else { "castscribe=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Harvest {
            api_key,
            channel,
            output_dir,
            languages,
        } => {
            let api_key = api_key
                .filter(|key| !key.trim().is_empty())
                .with_context(|| format!("YouTube API key not found, set {}", YOUTUBE_API_KEY_VAR))?;

            let config = Config::load()?;
            let channel = channel.unwrap_or(config.harvest.channel_handle);
            let output_dir = output_dir.unwrap_or(config.harvest.output_dir);
            let languages = if languages.is_empty() {
                config.harvest.languages
            } else {
                languages
            };

            let catalog = YoutubeCatalog::new(api_key)?;
            let transcripts = YoutubeTranscripts::new(languages)?;

            tracing::info!(channel = %channel, "Starting harvest");
            HarvestPipeline::new(&catalog, &transcripts, output_dir)
                .page_size(config.harvest.page_size)
                .show_progress(show_progress)
                .run(&channel)
                .await?;
        }
        Commands::Sync {
            input_dir,
            prefix,
            fail_on_error,
        } => {
            let config = Config::load()?;
            let store_settings = StoreSettings::from_env();
            let store = S3Store::connect(&store_settings).await;

            let input_dir = input_dir.unwrap_or(config.harvest.output_dir);
            let bucket = store_settings.bucket.clone().unwrap_or_default();

            let report = SyncPipeline::new(&store, bucket)
                .key_prefix(prefix.unwrap_or(config.sync.key_prefix))
                .extension(config.sync.extension)
                .show_progress(show_progress)
                .run(&input_dir)
                .await?;

            if fail_on_error && report.has_failures() {
                anyhow::bail!("{} upload(s) failed", report.failed.len());
            }
        }
        Commands::Config { show, init } => {
            if init {
                let path = Config::default().save_local()?;
                println!("Default configuration written to: {}", path.display());
            } else {
                let config = Config::load()?;
                let api_key_present = std::env::var(YOUTUBE_API_KEY_VAR)
                    .map(|key| !key.trim().is_empty())
                    .unwrap_or(false);
                if !show {
                    println!("Run with --show to print the configuration or --init to create config.yaml");
                }
                config.display(&StoreSettings::from_env(), api_key_present);
            }
        }
    }

    Ok(())
}
