use futures_util::stream::{self, Stream, TryStreamExt};

use super::{CatalogError, VideoCatalog, VideoRecord};

/// Where the next page request starts
enum Cursor {
    First,
    Next(String),
    Exhausted,
}

/// Lazily enumerate every video of a playlist.
///
/// Pages are requested one at a time, only when the previous page has been
/// consumed, and the stream ends once the provider stops returning a
/// continuation token. The first error ends the stream.
pub fn playlist_videos<'a>(
    catalog: &'a dyn VideoCatalog,
    playlist_id: &'a str,
    page_size: u32,
) -> impl Stream<Item = Result<VideoRecord, CatalogError>> + Send + 'a {
    stream::try_unfold(Cursor::First, move |cursor| async move {
        let page_token = match cursor {
            Cursor::Exhausted => return Ok(None),
            Cursor::First => None,
            Cursor::Next(token) => Some(token),
        };

        let page = catalog
            .list_playlist_page(playlist_id, page_token, page_size)
            .await?;
        tracing::debug!(
            playlist_id,
            items = page.items.len(),
            has_next = page.next_page_token.is_some(),
            "Fetched playlist page"
        );

        let next = match page.next_page_token {
            Some(token) if !token.is_empty() => Cursor::Next(token),
            _ => Cursor::Exhausted,
        };
        let items = stream::iter(page.items.into_iter().map(Ok::<_, CatalogError>));

        Ok::<_, CatalogError>(Some((items, next)))
    })
    .try_flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MockVideoCatalog, PlaylistPage};
    use chrono::{TimeZone, Utc};
    use futures_util::StreamExt;

    fn video(id: &str, day: u32) -> VideoRecord {
        VideoRecord {
            video_id: id.to_string(),
            title: format!("Episode {}", id),
            published_at: Utc.with_ymd_and_hms(2023, 1, day, 12, 0, 0).unwrap(),
        }
    }

    fn three_page_catalog() -> MockVideoCatalog {
        let mut catalog = MockVideoCatalog::new();
        catalog
            .expect_list_playlist_page()
            .returning(|playlist_id, token, page_size| {
                assert_eq!(playlist_id, "UU_uploads");
                assert_eq!(page_size, 50);
                let page = match token.as_deref() {
                    None => PlaylistPage {
                        items: vec![video("a", 5), video("b", 4)],
                        next_page_token: Some("page-2".to_string()),
                    },
                    Some("page-2") => PlaylistPage {
                        items: vec![video("c", 3), video("d", 2)],
                        next_page_token: Some("page-3".to_string()),
                    },
                    Some("page-3") => PlaylistPage {
                        items: vec![video("e", 1)],
                        next_page_token: None,
                    },
                    Some(other) => panic!("unexpected page token {}", other),
                };
                Ok(page)
            });
        catalog
    }

    #[tokio::test]
    async fn test_follows_tokens_without_skipping_or_duplicating() {
        let catalog = three_page_catalog();

        let videos: Vec<VideoRecord> = playlist_videos(&catalog, "UU_uploads", 50)
            .try_collect()
            .await
            .unwrap();

        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_enumeration_is_repeatable() {
        let catalog = three_page_catalog();

        let first: Vec<VideoRecord> = playlist_videos(&catalog, "UU_uploads", 50)
            .try_collect()
            .await
            .unwrap();
        let second: Vec<VideoRecord> = playlist_videos(&catalog, "UU_uploads", 50)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_pages_are_requested_lazily() {
        let mut catalog = MockVideoCatalog::new();
        catalog
            .expect_list_playlist_page()
            .times(1)
            .returning(|_, _, _| {
                Ok(PlaylistPage {
                    items: vec![video("a", 2), video("b", 1)],
                    next_page_token: Some("page-2".to_string()),
                })
            });

        let mut stream = Box::pin(playlist_videos(&catalog, "UU_uploads", 50));
        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();

        // Only the first page has been fetched so far.
        assert_eq!(first.video_id, "a");
        assert_eq!(second.video_id, "b");
    }

    #[tokio::test]
    async fn test_empty_token_ends_the_stream() {
        let mut catalog = MockVideoCatalog::new();
        catalog
            .expect_list_playlist_page()
            .times(1)
            .returning(|_, _, _| {
                Ok(PlaylistPage {
                    items: vec![video("a", 1)],
                    next_page_token: Some(String::new()),
                })
            });

        let videos: Vec<VideoRecord> = playlist_videos(&catalog, "UU_uploads", 50)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
    }

    #[tokio::test]
    async fn test_error_on_later_page_aborts_enumeration() {
        let mut catalog = MockVideoCatalog::new();
        catalog
            .expect_list_playlist_page()
            .returning(|_, token, _| match token {
                None => Ok(PlaylistPage {
                    items: vec![video("a", 2)],
                    next_page_token: Some("page-2".to_string()),
                }),
                Some(_) => Err(CatalogError::Api {
                    endpoint: "playlistItems",
                    status: 500,
                    message: "backendError".to_string(),
                }),
            });

        let result: Result<Vec<VideoRecord>, CatalogError> =
            playlist_videos(&catalog, "UU_uploads", 50)
                .try_collect()
                .await;

        assert!(matches!(
            result,
            Err(CatalogError::Api { status: 500, .. })
        ));
    }
}
