use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, COOKIE};
use serde::Deserialize;

use super::{timedtext, TranscriptError, TranscriptSegment, TranscriptSource};

const WATCH_URL: &str = "https://www.youtube.com/watch";

/// Caption track as listed in the watch page's player response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

/// Transcript provider reading YouTube caption tracks
pub struct YoutubeTranscripts {
    http: reqwest::Client,
    languages: Vec<String>,
}

impl YoutubeTranscripts {
    /// `languages` is the preference order of caption language codes
    pub fn new(languages: Vec<String>) -> Result<Self, TranscriptError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));
        // Skips the EU consent interstitial.
        headers.insert(COOKIE, HeaderValue::from_static("CONSENT=YES+cb"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { http, languages })
    }

    async fn watch_page(&self, video_id: &str) -> Result<String, TranscriptError> {
        let page = self
            .http
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(page)
    }
}

/// Extract the caption track list from a watch page
pub fn caption_tracks(video_id: &str, page: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let Some((_, after)) = page.split_once("\"captions\":") else {
        if page.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::RateLimited);
        }
        if !page.contains("\"playabilityStatus\":") {
            return Err(TranscriptError::VideoUnavailable(video_id.to_string()));
        }
        return Err(TranscriptError::Disabled(video_id.to_string()));
    };

    let json = after
        .split_once(",\"videoDetails")
        .map(|(captions, _)| captions)
        .ok_or_else(|| TranscriptError::Malformed("captions block is not terminated".to_string()))?;

    let captions: Captions = serde_json::from_str(json)
        .map_err(|e| TranscriptError::Malformed(format!("captions JSON: {}", e)))?;

    match captions.player_captions_tracklist_renderer {
        Some(renderer) if !renderer.caption_tracks.is_empty() => Ok(renderer.caption_tracks),
        _ => Err(TranscriptError::Disabled(video_id.to_string())),
    }
}

/// Pick a track for the first preferred language that has one, manual tracks first
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|language| {
        let mut candidates = tracks.iter().filter(|t| &t.language_code == language);
        let manual = candidates.clone().find(|t| !t.is_generated());
        manual.or_else(|| candidates.next())
    })
}

#[async_trait]
impl TranscriptSource for YoutubeTranscripts {
    async fn fetch_segments(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let page = self.watch_page(video_id).await?;
        let tracks = caption_tracks(video_id, &page)?;

        let track = select_track(&tracks, &self.languages).ok_or_else(|| TranscriptError::NotFound {
            video_id: video_id.to_string(),
            requested: self.languages.clone(),
            available: tracks.iter().map(|t| t.language_code.clone()).collect(),
        })?;
        tracing::debug!(
            video_id,
            language = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track"
        );

        let xml = self
            .http
            .get(&track.base_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        timedtext::parse(&xml)
    }
}
