use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::catalog::VideoRecord;
use crate::transcript::TranscriptDocument;
use crate::utils::sanitize_filename;

/// Extension of transcript files on disk
pub const TRANSCRIPT_EXTENSION: &str = "txt";

/// File name of an episode transcript:
/// `{episode:03}_{YYYY-MM-DD}_{sanitized title}.txt`
pub fn episode_filename(episode_number: usize, video: &VideoRecord) -> String {
    format!(
        "{:03}_{}_{}.{}",
        episode_number,
        video.published_at.format("%Y-%m-%d"),
        sanitize_filename(&video.title),
        TRANSCRIPT_EXTENSION
    )
}

/// Create the output directory if it does not exist yet
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs_err::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

/// Write a transcript to its episode file, replacing any previous version
pub fn save_transcript(
    output_dir: &Path,
    episode_number: usize,
    document: &TranscriptDocument<'_>,
) -> Result<PathBuf> {
    let path = output_dir.join(episode_filename(episode_number, document.video));
    tracing::debug!(path = %path.display(), "Saving transcript");

    fs_err::write(&path, &document.text)?;

    tracing::debug!(path = %path.display(), "Transcript saved successfully");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn video(title: &str) -> VideoRecord {
        VideoRecord {
            video_id: "abc123".to_string(),
            title: title.to_string(),
            published_at: Utc.with_ymd_and_hms(2022, 3, 7, 23, 59, 59).unwrap(),
        }
    }

    #[test]
    fn test_episode_filename() {
        assert_eq!(
            episode_filename(7, &video("Koopcast #7: Huizen? Ja/Nee")),
            "007_2022-03-07_Koopcast #7 Huizen JaNee.txt"
        );
        assert_eq!(episode_filename(123, &video("x")), "123_2022-03-07_x.txt");
        assert_eq!(episode_filename(1234, &video("x")), "1234_2022-03-07_x.txt");
    }

    #[test]
    fn test_same_title_and_date_distinct_by_number() {
        let v = video("Q&A: live?");
        assert_ne!(episode_filename(1, &v), episode_filename(2, &v));
    }

    #[test]
    fn test_save_transcript_writes_and_overwrites() {
        let dir = tempdir().unwrap();
        let v = video("Episode");

        let document = TranscriptDocument { video: &v, text: "first".to_string() };
        let path = save_transcript(dir.path(), 1, &document).unwrap();
        assert_eq!(path, dir.path().join("001_2022-03-07_Episode.txt"));
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "first");

        let document = TranscriptDocument { video: &v, text: "second".to_string() };
        let again = save_transcript(dir.path(), 1, &document).unwrap();
        assert_eq!(again, path);
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_ensure_output_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("transcripts");

        ensure_output_dir(&out).unwrap();
        ensure_output_dir(&out).unwrap();
        assert!(out.is_dir());
    }
}
