//! Photo storage behind a small trait so handlers do not depend on S3.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use derive_more::Display;
use uuid::Uuid;

const KEY_PREFIX_LEN: usize = 6;

#[derive(Debug, Display, PartialEq)]
pub enum MediaError {
    #[display(fmt = "media store not configured")]
    NotConfigured,
    #[display(fmt = "upload failed: {}", _0)]
    Upload(String),
}

impl std::error::Error for MediaError {}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `body` under `key` and returns the URL it is served from.
    async fn upload(&self, key: &str, body: Vec<u8>) -> Result<String, MediaError>;
}

/// Short random key that keeps the original file extension.
pub fn photo_key(original_file_name: &str) -> String {
    let extension = original_file_name
        .rfind('.')
        .map(|dot| &original_file_name[dot..])
        .filter(|ext| ext.len() > 1 && ext[1..].chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("");
    let id = Uuid::new_v4().simple().to_string();
    format!("{}{}", &id[..KEY_PREFIX_LEN], extension)
}

pub fn public_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!("{}{}/{}", base_url, bucket, key)
}

pub struct S3MediaStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    base_url: String,
}

impl S3MediaStore {
    /// Builds a client from the standard AWS credential chain.
    pub async fn from_env(bucket: String, base_url: String) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        S3MediaStore {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket,
            base_url,
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(&self, key: &str, body: Vec<u8>) -> Result<String, MediaError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| MediaError::Upload(DisplayErrorContext(&e).to_string()))?;

        Ok(public_url(&self.base_url, &self.bucket, key))
    }
}

/// Used when no bucket is configured; every upload fails.
pub struct UnconfiguredMediaStore;

#[async_trait]
impl MediaStore for UnconfiguredMediaStore {
    async fn upload(&self, _key: &str, _body: Vec<u8>) -> Result<String, MediaError> {
        Err(MediaError::NotConfigured)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records uploads in memory, or fails them all when `failing`.
    #[derive(Default)]
    pub struct MemoryMediaStore {
        pub failing: bool,
        pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl MediaStore for MemoryMediaStore {
        async fn upload(&self, key: &str, body: Vec<u8>) -> Result<String, MediaError> {
            if self.failing {
                return Err(MediaError::Upload("connection reset".to_string()));
            }
            self.uploads.lock().unwrap().push((key.to_string(), body));
            Ok(public_url("https://media.test/", "cats", key))
        }
    }
}
