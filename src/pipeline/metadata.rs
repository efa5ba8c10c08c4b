//! EXIF reporting path.
//!
//! Fetches an uploaded image and logs its tags as one structured record.

use super::PipelineError;
use crate::imaging::{ExifTags, ImageBackend};
use crate::storage::ObjectStore;
use std::sync::Arc;
use tracing::info;

pub async fn report_exif<S, B>(
    store: &S,
    backend: &Arc<B>,
    bucket: &str,
    key: &str,
) -> Result<ExifTags, PipelineError>
where
    S: ObjectStore + ?Sized,
    B: ImageBackend + 'static,
{
    let bytes = store.get(bucket, key).await?;

    let backend = backend.clone();
    let tags = tokio::task::spawn_blocking(move || backend.read_exif(&bytes)).await??;

    let rendered = serde_json::to_string(&tags).unwrap_or_default();
    info!(bucket, key, count = tags.len(), tags = %rendered, "exif tags");
    Ok(tags)
}
