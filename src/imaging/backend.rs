//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline needs
//! from a codec: identify, read_exif, and resize. All of them work on
//! in-memory bytes, since sources arrive from object storage rather than disk.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! and `kamadak-exif` crates.

use super::params::ResizeParams;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Embedded EXIF tags, tag name → display value.
pub type ExifTags = BTreeMap<String, String>;

/// Trait for image codec backends.
///
/// Implementations must be shareable across the blocking threads that
/// generate derivatives concurrently.
pub trait ImageBackend: Send + Sync {
    /// Decode natural dimensions.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode embedded EXIF tags. Images without EXIF yield an empty map.
    fn read_exif(&self, source: &[u8]) -> Result<ExifTags, BackendError>;

    /// Resize to exactly the requested dimensions and re-encode.
    fn resize(&self, source: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::{OutputFormat, Quality};
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works across spawned tasks.
    ///
    /// `resize` returns `"{width}x{height}"` as the encoded bytes so callers
    /// can tell derivatives apart.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub exif_results: Mutex<Vec<ExifTags>>,
        /// Resizes whose target width matches fail.
        pub fail_resize_width: Mutex<Option<u32>>,
        pub fail_exif: Mutex<bool>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(usize),
        ReadExif(usize),
        Resize {
            source_len: usize,
            width: u32,
            height: u32,
            quality: u32,
            preserve_metadata: bool,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn with_exif(tags: Vec<ExifTags>) -> Self {
            Self {
                exif_results: Mutex::new(tags),
                ..Self::default()
            }
        }

        pub fn failing_resize(self, width: u32) -> Self {
            *self.fail_resize_width.lock().unwrap() = Some(width);
            self
        }

        pub fn failing_exif(self) -> Self {
            *self.fail_exif.lock().unwrap() = true;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn resize_ops(&self) -> Vec<RecordedOp> {
            self.get_operations()
                .into_iter()
                .filter(|op| matches!(op, RecordedOp::Resize { .. }))
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(source.len()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn read_exif(&self, source: &[u8]) -> Result<ExifTags, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::ReadExif(source.len()));

            if *self.fail_exif.lock().unwrap() {
                return Err(BackendError::ProcessingFailed("mock exif failure".to_string()));
            }
            Ok(self.exif_results.lock().unwrap().pop().unwrap_or_default())
        }

        fn resize(&self, source: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source_len: source.len(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
                preserve_metadata: params.preserve_metadata,
            });
            if *self.fail_resize_width.lock().unwrap() == Some(params.width) {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock failure at width {}",
                    params.width
                )));
            }
            Ok(format!("{}x{}", params.width, params.height).into_bytes())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(b"jpeg").unwrap();
        assert_eq!(result.as_tuple(), (800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify(4)]);
    }

    #[test]
    fn mock_identify_without_results_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(b"jpeg").is_err());
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();

        let bytes = backend
            .resize(
                b"source",
                &ResizeParams {
                    width: 256,
                    height: 192,
                    format: OutputFormat::Jpeg,
                    quality: Quality::new(90),
                    preserve_metadata: true,
                },
            )
            .unwrap();
        assert_eq!(bytes, b"256x192");

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 256,
                height: 192,
                quality: 90,
                preserve_metadata: true,
                ..
            }
        ));
    }

    #[test]
    fn mock_fails_configured_width() {
        let backend = MockBackend::new().failing_resize(64);
        let params = ResizeParams {
            width: 64,
            height: 48,
            format: OutputFormat::Jpeg,
            quality: Quality::default(),
            preserve_metadata: false,
        };
        assert!(backend.resize(b"source", &params).is_err());
    }
}
