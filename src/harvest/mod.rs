use futures_util::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

use crate::catalog::{self, CatalogError, VideoCatalog, VideoRecord};
use crate::output;
use crate::transcript::{self, TranscriptSource};
use crate::utils::format_duration;

#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("No channel found for handle {0}")]
    ChannelNotResolved(String),

    #[error("Failed to resolve channel uploads: {0}")]
    Resolution(#[source] CatalogError),

    #[error("Failed to enumerate videos: {0}")]
    Enumeration(#[source] CatalogError),

    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

/// A video paired with its episode number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub number: usize,
    pub video: VideoRecord,
}

/// Outcome of a harvest run
#[derive(Debug, Default)]
pub struct HarvestReport {
    pub videos_found: usize,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

/// Sort newest first and number the episodes so the oldest video is 1 and
/// the newest is `videos.len()`.
///
/// Takes the complete video set; numbers are only meaningful when nothing
/// is missing. Videos published at the same instant keep their listing order.
pub fn number_episodes(mut videos: Vec<VideoRecord>) -> Vec<Episode> {
    videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let total = videos.len();
    videos
        .into_iter()
        .enumerate()
        .map(|(rank, video)| Episode {
            number: total - rank,
            video,
        })
        .collect()
}

/// Channel harvesting pipeline: channel -> uploads -> transcripts on disk
pub struct HarvestPipeline<'a> {
    catalog: &'a dyn VideoCatalog,
    transcripts: &'a dyn TranscriptSource,
    output_dir: PathBuf,
    page_size: u32,
    show_progress: bool,
}

impl<'a> HarvestPipeline<'a> {
    pub fn new(
        catalog: &'a dyn VideoCatalog,
        transcripts: &'a dyn TranscriptSource,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            transcripts,
            output_dir: output_dir.into(),
            page_size: catalog::DEFAULT_PAGE_SIZE,
            show_progress: false,
        }
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the whole pipeline for a channel handle.
    ///
    /// Nothing touches the filesystem until every video has been enumerated.
    pub async fn run(&self, channel_handle: &str) -> Result<HarvestReport, HarvestError> {
        let started = Instant::now();

        let playlist_id = self.resolve_playlist(channel_handle).await?;
        let videos = self.enumerate(&playlist_id).await?;
        tracing::info!(total = videos.len(), "Total videos found");

        let episodes = number_episodes(videos);

        output::ensure_output_dir(&self.output_dir)?;
        tracing::info!(output_dir = %self.output_dir.display(), "Output directory");

        let report = self.process(&episodes).await?;

        tracing::info!(
            found = report.videos_found,
            written = report.written.len(),
            skipped = report.skipped.len(),
            elapsed = %format_duration(started.elapsed()),
            "Harvest completed"
        );
        Ok(report)
    }

    async fn resolve_playlist(&self, channel_handle: &str) -> Result<String, HarvestError> {
        let channel_id = catalog::resolve_channel_id(self.catalog, channel_handle)
            .await
            .map_err(HarvestError::Resolution)?
            .ok_or_else(|| HarvestError::ChannelNotResolved(channel_handle.to_string()))?;

        self.catalog
            .uploads_playlist_id(&channel_id)
            .await
            .map_err(HarvestError::Resolution)
    }

    async fn enumerate(&self, playlist_id: &str) -> Result<Vec<VideoRecord>, HarvestError> {
        tracing::debug!(playlist_id, "Fetching video details");

        catalog::playlist_videos(self.catalog, playlist_id, self.page_size)
            .inspect_ok(|video| tracing::trace!(video_id = %video.video_id, "Enumerated video"))
            .try_collect()
            .await
            .map_err(HarvestError::Enumeration)
    }

    /// Fetch and save transcripts newest first; missing transcripts are skipped
    async fn process(&self, episodes: &[Episode]) -> Result<HarvestReport, HarvestError> {
        let mut report = HarvestReport {
            videos_found: episodes.len(),
            ..Default::default()
        };

        let progress = if self.show_progress {
            let bar = ProgressBar::new(episodes.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        for (index, episode) in episodes.iter().enumerate() {
            let video_id = episode.video.video_id.as_str();
            tracing::info!(
                video_id,
                episode = episode.number,
                "Processing video {}/{}",
                index + 1,
                episodes.len()
            );
            progress.set_message(episode.video.title.clone());

            match transcript::fetch_transcript(self.transcripts, &episode.video).await {
                Some(document) => {
                    let path = output::save_transcript(&self.output_dir, episode.number, &document)?;
                    tracing::info!(video_id, path = %path.display(), "Saved transcript");
                    report.written.push(path);
                }
                None => {
                    tracing::warn!(video_id, "No transcript available");
                    report.skipped.push(episode.video.video_id.clone());
                }
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(report)
    }
}
