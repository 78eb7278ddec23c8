use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::catalog::VideoRecord;

pub mod timedtext;
pub mod youtube;

pub use youtube::YoutubeTranscripts;

/// Individual caption segment with timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment text
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Full transcript text of one video, held in memory until it is written
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptDocument<'a> {
    pub video: &'a VideoRecord,
    pub text: String,
}

#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Subtitles are disabled for video {0}")]
    Disabled(String),

    #[error("Video {0} is unavailable")]
    VideoUnavailable(String),

    #[error("Too many requests, YouTube is asking for a captcha")]
    RateLimited,

    #[error("No transcript found for video {video_id} in {requested:?} (available: {available:?})")]
    NotFound {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("Malformed caption data: {0}")]
    Malformed(String),
}

/// Transcript provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the caption segments of a video in temporal order
    async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}

/// Join segment texts with single spaces, in the order given
pub fn join_segments(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetch the transcript of a video.
///
/// Every provider failure is logged here and turned into `None`; the caller
/// only decides whether to skip the video.
pub async fn fetch_transcript<'a>(
    source: &dyn TranscriptSource,
    video: &'a VideoRecord,
) -> Option<TranscriptDocument<'a>> {
    tracing::debug!(video_id = %video.video_id, "Fetching transcript");

    let segments = match source.fetch_segments(&video.video_id).await {
        Ok(segments) => segments,
        Err(err) => {
            tracing::error!(video_id = %video.video_id, error = %err, "Error getting transcript");
            return None;
        }
    };

    let text = join_segments(&segments);
    if text.is_empty() {
        tracing::debug!(video_id = %video.video_id, "Transcript is empty");
        return None;
    }

    tracing::debug!(
        video_id = %video.video_id,
        characters = text.chars().count(),
        "Transcript fetched successfully"
    );
    Some(TranscriptDocument { video, text })
}
