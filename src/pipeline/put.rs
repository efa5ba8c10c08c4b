//! Put handler: fetch an original and write one derivative per catalog entry.
//!
//! Every size runs in its own task and the CPU work of each runs on the
//! blocking pool. There is no rollback: if one size fails, siblings that
//! already landed stay in storage and the next delivery of the same
//! notification overwrites them with identical output.

use super::PipelineError;
use super::fanout::join_all_or_first_error;
use crate::catalog::{SizeCatalog, SizeSpec};
use crate::imaging::{DerivativeConfig, ImageBackend, create_derivative};
use crate::key::StorageKey;
use crate::storage::ObjectStore;
use crate::types::{SourceImage, WrittenDerivative};
use std::sync::Arc;
use tracing::{debug, info};

pub async fn handle_put<S, B>(
    store: &Arc<S>,
    backend: &Arc<B>,
    catalog: &SizeCatalog,
    config: DerivativeConfig,
    bucket: &str,
    key: &StorageKey,
) -> Result<Vec<WrittenDerivative>, PipelineError>
where
    S: ObjectStore + 'static,
    B: ImageBackend + 'static,
{
    let bytes = store.get(bucket, &key.to_string()).await?;
    let dimensions = backend.identify(&bytes)?;
    debug!(
        bucket,
        key = %key,
        width = dimensions.width,
        height = dimensions.height,
        bytes = bytes.len(),
        "fetched original"
    );

    let source = Arc::new(SourceImage {
        key: key.clone(),
        bytes,
        dimensions,
    });
    let bucket: Arc<str> = Arc::from(bucket);

    let tasks = catalog
        .iter()
        .map(|spec| {
            tokio::spawn(generate_and_store(
                store.clone(),
                backend.clone(),
                source.clone(),
                spec.clone(),
                config,
                bucket.clone(),
            ))
        })
        .collect();

    join_all_or_first_error(tasks).await
}

async fn generate_and_store<S, B>(
    store: Arc<S>,
    backend: Arc<B>,
    source: Arc<SourceImage>,
    spec: SizeSpec,
    config: DerivativeConfig,
    bucket: Arc<str>,
) -> Result<WrittenDerivative, PipelineError>
where
    S: ObjectStore + 'static,
    B: ImageBackend + 'static,
{
    let size = spec.name.clone();
    let derivative = tokio::task::spawn_blocking(move || {
        create_derivative(backend.as_ref(), &source, &spec, &config)
    })
    .await??;

    let target = derivative.key.to_string();
    store
        .put(
            &bucket,
            &target,
            derivative.bytes.clone(),
            derivative.content_type,
        )
        .await?;

    info!(
        bucket = %bucket,
        key = %target,
        size = %size,
        width = derivative.width,
        height = derivative.height,
        "wrote derivative"
    );
    Ok(WrittenDerivative::from_derivative(&size, &derivative))
}
