//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::compute_target_dimensions;
use super::params::{OutputFormat, Quality, ResizeParams};
use crate::catalog::SizeSpec;
use crate::types::{Derivative, SourceImage};
use bytes::Bytes;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, source: &[u8]) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok((dims.width, dims.height))
}

/// Encoding settings shared by every derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativeConfig {
    pub format: OutputFormat,
    pub quality: Quality,
    pub preserve_metadata: bool,
}

impl Default for DerivativeConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: Quality::maximum(),
            preserve_metadata: true,
        }
    }
}

/// Plan a derivative resize without executing it.
pub fn plan_derivative(
    natural: (u32, u32),
    spec: &SizeSpec,
    config: &DerivativeConfig,
) -> ResizeParams {
    let (width, height) = compute_target_dimensions(natural, spec.max_dimension);
    ResizeParams {
        width,
        height,
        format: config.format,
        quality: config.quality,
        preserve_metadata: config.preserve_metadata,
    }
}

/// Create the derivative of `source` for one catalog entry.
///
/// CPU-bound: callers on an async runtime should run this on a blocking thread.
pub fn create_derivative(
    backend: &impl ImageBackend,
    source: &SourceImage,
    spec: &SizeSpec,
    config: &DerivativeConfig,
) -> Result<Derivative> {
    let params = plan_derivative(source.dimensions.as_tuple(), spec, config);
    let bytes = backend.resize(&source.bytes, &params)?;

    Ok(Derivative {
        key: source.key.derive(&spec.name),
        bytes: Bytes::from(bytes),
        content_type: params.format.content_type(),
        width: params.width,
        height: params.height,
    })
}
