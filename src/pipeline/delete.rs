//! Delete handler: remove every derivative of a deleted original.
//!
//! Runs through the catalog in order. A derivative that is already gone
//! counts as deleted, so replaying the same notification is harmless.

use super::PipelineError;
use crate::catalog::SizeCatalog;
use crate::key::StorageKey;
use crate::storage::ObjectStore;
use crate::types::RemovedDerivative;
use tracing::{debug, info};

pub async fn handle_delete<S>(
    store: &S,
    catalog: &SizeCatalog,
    bucket: &str,
    key: &StorageKey,
) -> Result<Vec<RemovedDerivative>, PipelineError>
where
    S: ObjectStore + ?Sized,
{
    let mut removed = Vec::with_capacity(catalog.len());

    for spec in catalog {
        let target = key.derive(&spec.name).to_string();
        let already_absent = match store.delete(bucket, &target).await {
            Ok(()) => {
                info!(bucket, key = %target, size = %spec.name, "deleted derivative");
                false
            }
            Err(e) if e.is_not_found() => {
                debug!(bucket, key = %target, size = %spec.name, "derivative already absent");
                true
            }
            Err(e) => return Err(e.into()),
        };
        removed.push(RemovedDerivative {
            size: spec.name.clone(),
            key: target,
            already_absent,
        });
    }

    Ok(removed)
}
