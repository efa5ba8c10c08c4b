//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what derivative to create) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 100). Clamped on construction.
//! - [`OutputFormat`] — The single encoding every derivative is written in.
//! - [`ResizeParams`] — Everything one resize needs: target dimensions, format, quality, metadata policy.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// The value as the JPEG encoder takes it. Never outside 1..=100.
    pub fn as_u8(self) -> u8 {
        self.0 as u8
    }

    /// Highest quality the encoder supports.
    pub fn maximum() -> Self {
        Self(100)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::maximum()
    }
}

/// Encoding of generated derivatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Parameters for a single derivative resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
    /// Re-embed the source's EXIF block into the output.
    pub preserve_metadata: bool,
}
