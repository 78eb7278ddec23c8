use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::{CatalogError, PlaylistPage, VideoCatalog, VideoRecord};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// YouTube Data API v3 client
pub struct YoutubeCatalog {
    http: reqwest::Client,
    api_key: String,
    base_url: Url,
}

impl YoutubeCatalog {
    pub fn new(api_key: impl Into<String>) -> Result<Self, CatalogError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at a different API root (must end with a slash)
    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: Url::parse(base_url)?,
        })
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.join(endpoint)?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().copied())
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = self.endpoint_url(endpoint, params)?;
        tracing::debug!(endpoint, ?params, "Calling YouTube Data API");

        let http_error = |source| CatalogError::Http { endpoint, source };
        let response = self.http.get(url).send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                endpoint,
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        response.json::<T>().await.map_err(http_error)
    }
}

/// Pull `error.message` out of a Google API error body, falling back to the raw body
fn api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemListResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    published_at: DateTime<Utc>,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

impl From<PlaylistItemListResponse> for PlaylistPage {
    fn from(response: PlaylistItemListResponse) -> Self {
        let items = response
            .items
            .into_iter()
            .map(|item| VideoRecord {
                video_id: item.snippet.resource_id.video_id,
                title: item.snippet.title,
                published_at: item.snippet.published_at,
            })
            .collect();

        PlaylistPage {
            items,
            next_page_token: response.next_page_token,
        }
    }
}

#[async_trait]
impl VideoCatalog for YoutubeCatalog {
    async fn search_channels(&self, query: &str) -> Result<Vec<String>, CatalogError> {
        let response: SearchResponse = self
            .get_json("search", &[("part", "id"), ("q", query), ("type", "channel")])
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.id.channel_id)
            .collect())
    }

    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<String, CatalogError> {
        tracing::debug!(channel_id, "Fetching uploads playlist ID");

        let response: ChannelListResponse = self
            .get_json("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;

        let playlist_id = response
            .items
            .into_iter()
            .next()
            .map(|channel| channel.content_details.related_playlists.uploads)
            .ok_or_else(|| CatalogError::ChannelNotFound(channel_id.to_string()))?;

        tracing::debug!(channel_id, playlist_id = %playlist_id, "Resolved uploads playlist");
        Ok(playlist_id)
    }

    async fn list_playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<PlaylistPage, CatalogError> {
        let max_results = page_size.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token.as_deref() {
            params.push(("pageToken", token));
        }

        let response: PlaylistItemListResponse = self.get_json("playlistItems", &params).await?;
        Ok(response.into())
    }
}
