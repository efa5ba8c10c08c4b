//! [`ObjectStore`] over `aws-sdk-s3`.
//!
//! One client is built per process and shared by every notification.

use super::{ObjectStore, StorageError};
use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

/// Load shared AWS settings, applying the region/endpoint overrides.
///
/// Used for both the S3 client and the SQS listener.
pub async fn load_sdk_config(config: &StorageConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}

#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(sdk: &SdkConfig, config: &StorageConfig) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk)
            .force_path_style(config.force_path_style)
            .build();
        Self::new(Client::from_conf(s3_config))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::not_found(bucket, key)
                } else {
                    StorageError::Read {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        message: DisplayErrorContext(&e).to_string(),
                    }
                }
            })?;

        let body = output.body.collect().await.map_err(|e| StorageError::Read {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(body.into_bytes())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Put {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                // S3 itself answers 204 for absent keys; compatible servers may not.
                if e.as_service_error().and_then(|se| se.code()) == Some("NoSuchKey") {
                    StorageError::not_found(bucket, key)
                } else {
                    StorageError::Delete {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        message: DisplayErrorContext(&e).to_string(),
                    }
                }
            })?;
        Ok(())
    }
}
