//! Image processing with pure Rust codecs.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **EXIF tags** | `kamadak-exif` |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder`, source EXIF passed to the encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub(crate) mod exif;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ExifTags, ImageBackend};
pub use calculations::compute_target_dimensions;
pub use operations::{DerivativeConfig, create_derivative, get_dimensions, plan_derivative};
pub use params::{OutputFormat, Quality, ResizeParams};
pub use rust_backend::RustBackend;
