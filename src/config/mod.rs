use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::DEFAULT_PAGE_SIZE;
use crate::output::TRANSCRIPT_EXTENSION;
use crate::sync::DEFAULT_KEY_PREFIX;

pub const YOUTUBE_API_KEY_VAR: &str = "YOUTUBE_API_KEY";
pub const STORE_REGION_VAR: &str = "DO_SPACE_REGION";
pub const STORE_ENDPOINT_VAR: &str = "DO_SPACE_ENDPOINT";
pub const STORE_KEY_VAR: &str = "DO_SPACE_KEY";
pub const STORE_SECRET_VAR: &str = "DO_SPACE_SECRET";
pub const STORE_BUCKET_VAR: &str = "DO_SPACE_BUCKET";

/// YouTube Data API allows at most this many items per page
const MAX_PAGE_SIZE: u32 = 50;

/// Non-secret settings, read from `config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Harvester settings
    pub harvest: HarvestSettings,

    /// Syncer settings
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    /// Channel handle to search for
    pub channel_handle: String,

    /// Directory transcripts are written to
    pub output_dir: PathBuf,

    /// Playlist items per API page
    pub page_size: u32,

    /// Caption languages in order of preference
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Key prefix in the bucket
    pub key_prefix: String,

    /// Only files with this extension are uploaded
    pub extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            harvest: HarvestSettings::default(),
            sync: SyncSettings::default(),
        }
    }
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            channel_handle: "@koopcast".to_string(),
            output_dir: PathBuf::from("transcripts"),
            page_size: DEFAULT_PAGE_SIZE,
            languages: vec!["en".to_string()],
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            extension: TRANSCRIPT_EXTENSION.to_string(),
        }
    }
}

/// Object store connection settings, read from the environment.
///
/// All fields are optional; missing values only fail once an upload is attempted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSettings {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
}

impl StoreSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            region: get(STORE_REGION_VAR),
            endpoint: get(STORE_ENDPOINT_VAR),
            access_key: get(STORE_KEY_VAR),
            secret_key: get(STORE_SECRET_VAR),
            bucket: get(STORE_BUCKET_VAR),
        }
    }
}

impl Config {
    /// Load configuration from file, or defaults when there is none
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Write this configuration to `./config.yaml`
    pub fn save_local(&self) -> Result<PathBuf> {
        let path = PathBuf::from("config.yaml");
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs_err::write(&path, content).context("Failed to write config file")?;

        Ok(path)
    }

    /// Existing config file, if any
    fn config_path() -> Option<PathBuf> {
        // Current directory first, then the user config directory.
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("castscribe").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.harvest.channel_handle.trim().is_empty() {
            anyhow::bail!("harvest.channel_handle must not be empty");
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.harvest.page_size) {
            anyhow::bail!(
                "harvest.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.harvest.page_size
            );
        }

        if self.harvest.languages.is_empty() {
            anyhow::bail!("harvest.languages must list at least one language code");
        }

        if self.sync.key_prefix.trim_matches('/').is_empty() {
            anyhow::bail!("sync.key_prefix must not be empty");
        }

        if self.sync.extension.is_empty() || self.sync.extension.starts_with('.') {
            anyhow::bail!("sync.extension must be a bare extension such as \"txt\"");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self, store: &StoreSettings, api_key_present: bool) {
        fn show(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("<not set>")
        }

        println!("Current Configuration:");
        println!("  Channel: {}", self.harvest.channel_handle);
        println!("  Output Directory: {}", self.harvest.output_dir.display());
        println!("  Page Size: {}", self.harvest.page_size);
        println!("  Languages: {}", self.harvest.languages.join(", "));
        println!(
            "  YouTube API Key: {}",
            if api_key_present { "<set>" } else { "<not set>" }
        );
        println!("  Key Prefix: {}", self.sync.key_prefix);
        println!("  Extension: .{}", self.sync.extension);
        println!("  Store Region: {}", show(&store.region));
        println!("  Store Endpoint: {}", show(&store.endpoint));
        println!("  Store Bucket: {}", show(&store.bucket));
        println!(
            "  Store Credentials: {}",
            if store.access_key.is_some() && store.secret_key.is_some() {
                "<set>"
            } else {
                "<not set>"
            }
        );
    }
}
