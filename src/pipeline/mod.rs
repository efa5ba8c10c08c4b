//! Notification processing.
//!
//! A [`Pipeline`] owns the injected storage client, codec backend, and size
//! catalog, and runs each notification through two independent paths:
//!
//! - **Derivatives**: originals under `{container}/full/{file}` get one
//!   resized JPEG per catalog entry on upload; on delete, those derivatives
//!   are removed. See [`dispatch::route`], [`put`], [`delete`].
//! - **Metadata**: any uploaded object whose extension names an image type
//!   has its EXIF tags logged. See [`dispatch::route_metadata`], [`metadata`].
//!
//! Each path can be switched off in config. Enabled paths run concurrently
//! and one path's failure never stops the other (see [`PipelineError::Path`]).
//! Nothing is shared between notifications apart from the injected handles.

pub mod delete;
pub mod dispatch;
pub mod fanout;
pub mod metadata;
pub mod put;

use crate::catalog::SizeCatalog;
use crate::config::{ConfigError, PipelineConfig};
use crate::imaging::{BackendError, DerivativeConfig, ExifTags, ImageBackend};
use crate::key::KeyError;
use crate::notification::{Notification, S3Event};
use crate::storage::{ObjectStore, StorageError};
use crate::types::{RemovedDerivative, WrittenDerivative};
use dispatch::{MetadataRoute, Route};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("codec error: {0}")]
    Backend(#[from] BackendError),
    #[error("derivative task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// A path failed while another path also ran; `completed` holds the
    /// outcomes of the paths that finished.
    #[error("{path} path failed: {source}")]
    Path {
        path: PathKind,
        completed: Vec<Outcome>,
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Replaying the same notification cannot succeed.
    pub fn is_permanent(&self) -> bool {
        match self {
            PipelineError::Key(_) => true,
            PipelineError::Path { source, .. } => source.is_permanent(),
            _ => false,
        }
    }

    /// Outcomes of paths that finished before the notification failed.
    pub fn completed(&self) -> &[Outcome] {
        match self {
            PipelineError::Path { completed, .. } => completed,
            _ => &[],
        }
    }
}

/// Why a path left a notification alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The variant segment is a derivative size, not `full`.
    NotOriginal { variant: String },
    UnsupportedEvent(String),
    /// Keys ending in `/` are folder placeholders, not objects.
    DirectoryMarker,
    /// The extension does not map to an `image/*` content type.
    NotAnImage,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NotOriginal { variant } => {
                write!(f, "variant {variant:?} is not an original")
            }
            IgnoreReason::UnsupportedEvent(name) => write!(f, "event {name} is not handled"),
            IgnoreReason::DirectoryMarker => f.write_str("directory marker"),
            IgnoreReason::NotAnImage => f.write_str("not an image"),
        }
    }
}

/// Which of the two paths produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Derivatives,
    Metadata,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathKind::Derivatives => "derivatives",
            PathKind::Metadata => "metadata",
        })
    }
}

/// Result of running one path over one notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ignored {
        path: PathKind,
        key: String,
        reason: IgnoreReason,
    },
    Generated {
        source: String,
        derivatives: Vec<WrittenDerivative>,
    },
    Deleted {
        source: String,
        derivatives: Vec<RemovedDerivative>,
    },
    Metadata {
        key: String,
        tags: ExifTags,
    },
}

pub struct Pipeline<S, B> {
    store: Arc<S>,
    backend: Arc<B>,
    catalog: SizeCatalog,
    derivative_config: DerivativeConfig,
    derivatives_enabled: bool,
    metadata_enabled: bool,
}

impl<S, B> Pipeline<S, B>
where
    S: ObjectStore + 'static,
    B: ImageBackend + 'static,
{
    /// Both paths enabled, default encoding settings.
    pub fn new(store: Arc<S>, backend: Arc<B>, catalog: SizeCatalog) -> Self {
        Self {
            store,
            backend,
            catalog,
            derivative_config: DerivativeConfig::default(),
            derivatives_enabled: true,
            metadata_enabled: true,
        }
    }

    pub fn from_config(
        store: Arc<S>,
        backend: Arc<B>,
        config: &PipelineConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(store, backend, config.catalog()?)
            .with_derivative_config(config.derivative_config())
            .with_derivatives(config.derivatives.enabled)
            .with_metadata(config.metadata.enabled))
    }

    pub fn with_derivative_config(mut self, config: DerivativeConfig) -> Self {
        self.derivative_config = config;
        self
    }

    pub fn with_derivatives(mut self, enabled: bool) -> Self {
        self.derivatives_enabled = enabled;
        self
    }

    pub fn with_metadata(mut self, enabled: bool) -> Self {
        self.metadata_enabled = enabled;
        self
    }

    pub fn catalog(&self) -> &SizeCatalog {
        &self.catalog
    }

    /// Process every record of an event document in order.
    ///
    /// The first failing record aborts the rest.
    pub async fn handle_event(&self, event: S3Event) -> Result<Vec<Outcome>, PipelineError> {
        let mut outcomes = Vec::new();
        for notification in event.into_notifications() {
            outcomes.extend(self.handle(&notification).await?);
        }
        Ok(outcomes)
    }

    /// Run every enabled path over one notification.
    ///
    /// The paths run concurrently and neither waits on the other's result.
    /// If one fails, the error carries the other's outcome. If both fail, the
    /// retryable error wins so the notification is not dropped while a retry
    /// could still help.
    pub async fn handle(&self, notification: &Notification) -> Result<Vec<Outcome>, PipelineError> {
        info!(
            event = %notification.event,
            bucket = %notification.bucket,
            key = %notification.raw_key,
            size = ?notification.size,
            "received notification"
        );

        let (derivatives, metadata) = tokio::join!(
            async {
                if self.derivatives_enabled {
                    Some(self.run_derivatives(notification).await)
                } else {
                    None
                }
            },
            async {
                if self.metadata_enabled {
                    Some(self.run_metadata(notification).await)
                } else {
                    None
                }
            },
        );

        let mut completed = Vec::with_capacity(2);
        let mut failed = Vec::new();
        for (path, result) in [
            (PathKind::Derivatives, derivatives),
            (PathKind::Metadata, metadata),
        ] {
            match result {
                Some(Ok(outcome)) => completed.push(outcome),
                Some(Err(e)) => {
                    error!(path = %path, key = %notification.raw_key, error = %e, "path failed");
                    failed.push((path, e));
                }
                None => {}
            }
        }

        if failed.is_empty() {
            return Ok(completed);
        }
        let index = failed
            .iter()
            .position(|(_, e)| !e.is_permanent())
            .unwrap_or(0);
        let (path, source) = failed.swap_remove(index);
        if completed.is_empty() && failed.is_empty() {
            return Err(source);
        }
        Err(PipelineError::Path {
            path,
            completed,
            source: Box::new(source),
        })
    }

    async fn run_derivatives(&self, notification: &Notification) -> Result<Outcome, PipelineError> {
        let bucket = notification.bucket.as_str();
        match dispatch::route(notification)? {
            Route::Ignored(reason) => Ok(ignored(PathKind::Derivatives, notification, reason)),
            Route::Put(key) => {
                let derivatives = put::handle_put(
                    &self.store,
                    &self.backend,
                    &self.catalog,
                    self.derivative_config,
                    bucket,
                    &key,
                )
                .await?;
                Ok(Outcome::Generated {
                    source: key.to_string(),
                    derivatives,
                })
            }
            Route::Delete(key) => {
                let derivatives =
                    delete::handle_delete(self.store.as_ref(), &self.catalog, bucket, &key)
                        .await?;
                Ok(Outcome::Deleted {
                    source: key.to_string(),
                    derivatives,
                })
            }
        }
    }

    async fn run_metadata(&self, notification: &Notification) -> Result<Outcome, PipelineError> {
        match dispatch::route_metadata(notification)? {
            MetadataRoute::Ignored(reason) => Ok(ignored(PathKind::Metadata, notification, reason)),
            MetadataRoute::Report(key) => {
                let tags = metadata::report_exif(
                    self.store.as_ref(),
                    &self.backend,
                    &notification.bucket,
                    &key,
                )
                .await?;
                Ok(Outcome::Metadata { key, tags })
            }
        }
    }
}

fn ignored(path: PathKind, notification: &Notification, reason: IgnoreReason) -> Outcome {
    info!(
        path = %path,
        key = %notification.raw_key,
        reason = %reason,
        "ignored notification"
    );
    Outcome::Ignored {
        path,
        key: notification.raw_key.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SizeSpec;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::MockBackend;
    use crate::notification::EventKind;
    use crate::storage::tests::{MemoryStore, StoreCall};

    fn pipeline(store: Arc<MemoryStore>, backend: Arc<MockBackend>) -> Pipeline<MemoryStore, MockBackend> {
        Pipeline::new(store, backend, SizeCatalog::default())
    }

    fn landscape() -> Arc<MockBackend> {
        Arc::new(MockBackend::with_dimensions(vec![Dimensions {
            width: 4000,
            height: 3000,
        }]))
    }

    #[tokio::test]
    async fn put_runs_both_paths() {
        let store = Arc::new(
            MemoryStore::new().with_object("b", "vacation/full/sunset.jpg", &b"original"[..]),
        );
        let outcomes = pipeline(store.clone(), landscape())
            .handle(&Notification::new(
                EventKind::ObjectCreatedPut,
                "b",
                "vacation/full/sunset.jpg",
            ))
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            &outcomes[0],
            Outcome::Generated { source, derivatives }
                if source == "vacation/full/sunset.jpg" && derivatives.len() == 1
        ));
        assert!(matches!(&outcomes[1], Outcome::Metadata { key, tags }
            if key == "vacation/full/sunset.jpg" && tags.is_empty()));
        assert!(store.contains("b", "vacation/thumb/sunset.jpg"));
    }

    #[tokio::test]
    async fn derivative_key_makes_no_storage_calls() {
        let store = Arc::new(MemoryStore::new());
        let outcomes = pipeline(store.clone(), landscape())
            .with_metadata(false)
            .handle(&Notification::new(
                EventKind::ObjectCreatedPut,
                "b",
                "vacation/thumb/sunset.jpg",
            ))
            .await
            .unwrap();

        assert!(matches!(
            &outcomes[0],
            Outcome::Ignored {
                path: PathKind::Derivatives,
                reason: IgnoreReason::NotOriginal { .. },
                ..
            }
        ));
        assert!(store.get_calls().is_empty());
    }

    #[tokio::test]
    async fn disabled_paths_do_nothing() {
        let store = Arc::new(MemoryStore::new());
        let outcomes = pipeline(store.clone(), landscape())
            .with_derivatives(false)
            .with_metadata(false)
            .handle(&Notification::new(
                EventKind::ObjectCreatedPut,
                "b",
                "vacation/full/sunset.jpg",
            ))
            .await
            .unwrap();

        assert!(outcomes.is_empty());
        assert!(store.get_calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_key_propagates() {
        let store = Arc::new(MemoryStore::new());
        let err = pipeline(store, landscape())
            .with_metadata(false)
            .handle(&Notification::new(
                EventKind::ObjectCreatedPut,
                "b",
                "sunset.jpg",
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Key(KeyError::MalformedKey { .. })));
        assert!(err.is_permanent());
    }

    // =========================================================================
    // Path independence
    // =========================================================================

    #[tokio::test]
    async fn malformed_key_still_reports_metadata() {
        let store = Arc::new(MemoryStore::new().with_object("b", "sunset.jpg", &b"img"[..]));
        let err = pipeline(store.clone(), landscape())
            .handle(&Notification::new(
                EventKind::ObjectCreatedPut,
                "b",
                "sunset.jpg",
            ))
            .await
            .unwrap_err();

        match &err {
            PipelineError::Path {
                path,
                completed,
                source,
            } => {
                assert_eq!(*path, PathKind::Derivatives);
                assert!(matches!(source.as_ref(), PipelineError::Key(_)));
                assert!(matches!(completed.as_slice(), [Outcome::Metadata { key, .. }] if key == "sunset.jpg"));
            }
            other => panic!("expected path failure, got {other:?}"),
        }
        assert!(err.is_permanent());
        assert_eq!(err.completed().len(), 1);
        assert_eq!(store.get_calls().len(), 1);
    }

    #[tokio::test]
    async fn metadata_failure_keeps_generated_derivatives() {
        let store = Arc::new(
            MemoryStore::new().with_object("b", "vacation/full/sunset.jpg", &b"original"[..]),
        );
        let backend = Arc::new(
            MockBackend::with_dimensions(vec![Dimensions {
                width: 4000,
                height: 3000,
            }])
            .failing_exif(),
        );
        let err = pipeline(store.clone(), backend)
            .handle(&Notification::new(
                EventKind::ObjectCreatedPut,
                "b",
                "vacation/full/sunset.jpg",
            ))
            .await
            .unwrap_err();

        assert!(matches!(&err, PipelineError::Path { path: PathKind::Metadata, .. }));
        assert!(matches!(err.completed(), [Outcome::Generated { .. }]));
        assert!(!err.is_permanent());
        assert!(store.contains("b", "vacation/thumb/sunset.jpg"));
    }

    #[tokio::test]
    async fn retryable_failure_wins_when_both_paths_fail() {
        // Nothing stored: metadata fetch misses, derivative key is malformed.
        let store = Arc::new(MemoryStore::new());
        let err = pipeline(store, landscape())
            .handle(&Notification::new(
                EventKind::ObjectCreatedPut,
                "b",
                "uploads/sunset.jpg",
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            PipelineError::Path { path: PathKind::Metadata, source, .. }
                if matches!(source.as_ref(), PipelineError::Storage(_))
        ));
        assert!(err.completed().is_empty());
        assert!(!err.is_permanent());
    }

    #[tokio::test]
    async fn malformed_key_is_fine_for_metadata_only() {
        let store = Arc::new(MemoryStore::new().with_object("b", "sunset.jpg", &b"img"[..]));
        let outcomes = pipeline(store, landscape())
            .with_derivatives(false)
            .handle(&Notification::new(
                EventKind::ObjectCreatedPut,
                "b",
                "sunset.jpg",
            ))
            .await
            .unwrap();
        assert!(matches!(&outcomes[0], Outcome::Metadata { .. }));
    }

    #[tokio::test]
    async fn delete_event_removes_derivatives() {
        let store = Arc::new(
            MemoryStore::new().with_object("b", "vacation/thumb/sunset.jpg", &b"x"[..]),
        );
        let outcomes = pipeline(store.clone(), Arc::new(MockBackend::new()))
            .handle(&Notification::new(
                EventKind::ObjectRemovedDelete,
                "b",
                "vacation/full/sunset.jpg",
            ))
            .await
            .unwrap();

        assert!(matches!(&outcomes[0], Outcome::Deleted { derivatives, .. }
            if derivatives.len() == 1 && !derivatives[0].already_absent));
        assert!(matches!(
            &outcomes[1],
            Outcome::Ignored {
                path: PathKind::Metadata,
                reason: IgnoreReason::UnsupportedEvent(_),
                ..
            }
        ));
        assert_eq!(
            store.get_calls(),
            vec![StoreCall::Delete {
                bucket: "b".to_string(),
                key: "vacation/thumb/sunset.jpg".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn handle_event_processes_every_record() {
        let json = r#"{"Records":[
            {"eventName":"ObjectRemoved:Delete","s3":{"bucket":{"name":"b"},"object":{"key":"a/full/one.jpg"}}},
            {"eventName":"ObjectRemoved:Delete","s3":{"bucket":{"name":"b"},"object":{"key":"a/full/two.jpg"}}}
        ]}"#;
        let store = Arc::new(MemoryStore::new());
        let catalog = SizeCatalog::new(vec![SizeSpec::new("thumb", 256)]).unwrap();
        let outcomes = Pipeline::new(store.clone(), Arc::new(MockBackend::new()), catalog)
            .with_metadata(false)
            .handle_event(S3Event::from_json(json).unwrap())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(store.get_calls().len(), 2);
    }

    #[test]
    fn from_config_rejects_invalid_catalog() {
        let mut config = PipelineConfig::default();
        config.sizes.clear();
        let result = Pipeline::from_config(
            Arc::new(MemoryStore::new()),
            Arc::new(MockBackend::new()),
            &config,
        );
        assert!(result.is_err());
    }

    #[test]
    fn ignore_reasons_render() {
        assert_eq!(
            IgnoreReason::NotOriginal {
                variant: "thumb".to_string()
            }
            .to_string(),
            "variant \"thumb\" is not an original"
        );
        assert_eq!(IgnoreReason::NotAnImage.to_string(), "not an image");
    }
}
