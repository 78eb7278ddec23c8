//! castscribe - archive the transcripts of a YouTube channel
//!
//! Two independent pipelines: the harvester enumerates every upload of a
//! channel, numbers the episodes oldest-first and writes one text file per
//! available transcript; the syncer mirrors those files into an
//! S3-compatible bucket.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod harvest;
pub mod output;
pub mod sync;
pub mod transcript;
pub mod utils;

pub use catalog::{VideoCatalog, VideoRecord, YoutubeCatalog};
pub use cli::{Cli, Commands};
pub use config::{Config, StoreSettings};
pub use harvest::{HarvestError, HarvestPipeline, HarvestReport};
pub use sync::{ObjectStore, S3Store, SyncError, SyncPipeline, SyncReport};
pub use transcript::{TranscriptSource, YoutubeTranscripts};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
