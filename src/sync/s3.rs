use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use std::path::Path;

use super::{ObjectStore, StoreError};
use crate::config::StoreSettings;
use crate::utils::format_file_size;

const TRANSCRIPT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// S3-compatible object store (AWS, DigitalOcean Spaces, MinIO, ...)
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    /// Build the client from whatever settings are present.
    ///
    /// Nothing is validated here: missing credentials, region or endpoint
    /// only surface when the first upload is attempted.
    pub async fn connect(settings: &StoreSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(key), Some(secret)) = (&settings.access_key, &settings.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                key,
                secret,
                None,
                None,
                "castscribe-environment",
            ));
        }

        let sdk_config = loader.load().await;
        Self {
            client: S3Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<(), StoreError> {
        if bucket.is_empty() {
            return Err(StoreError::MissingBucket);
        }

        let content = fs_err::read(local_path)?;
        tracing::debug!(
            bucket,
            key,
            size = %format_file_size(content.len() as u64),
            "Uploading object"
        );

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(TRANSCRIPT_CONTENT_TYPE)
            .body(content.into())
            .send()
            .await
            .map_err(|err| StoreError::Upload {
                key: key.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(())
    }
}
