use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

pub mod pagination;
pub mod youtube;

pub use pagination::playlist_videos;
pub use youtube::YoutubeCatalog;

/// Number of playlist items requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A single video from a channel's uploads playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Opaque video identifier
    pub video_id: String,

    /// Video title as published
    pub title: String,

    /// Publication timestamp
    pub published_at: DateTime<Utc>,
}

/// One page of a playlist listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistPage {
    /// Videos on this page, in provider order
    pub items: Vec<VideoRecord>,

    /// Continuation token for the next page, `None` on the last page
    pub next_page_token: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {message}")]
    Api {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Channel and video metadata provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Search channels by a human-facing handle and return the matching
    /// channel ids in provider order
    async fn search_channels(&self, query: &str) -> Result<Vec<String>, CatalogError>;

    /// Look up the id of a channel's uploads playlist
    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<String, CatalogError>;

    /// Fetch one page of playlist items
    async fn list_playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<PlaylistPage, CatalogError>;
}

/// Resolve a channel handle to a channel id.
///
/// The first search hit wins; `None` when the search came back empty.
pub async fn resolve_channel_id(
    catalog: &dyn VideoCatalog,
    handle: &str,
) -> Result<Option<String>, CatalogError> {
    tracing::debug!(handle, "Fetching channel ID");

    let channel_id = catalog.search_channels(handle).await?.into_iter().next();
    match &channel_id {
        Some(id) => tracing::debug!(handle, channel_id = %id, "Resolved channel"),
        None => tracing::error!(handle, "No channel found"),
    }

    Ok(channel_id)
}
