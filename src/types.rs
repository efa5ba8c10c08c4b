//! Short-lived values passed between pipeline stages.
//!
//! Nothing here outlives the processing of a single notification.

use crate::imaging::Dimensions;
use crate::key::StorageKey;
use bytes::Bytes;
use serde::Serialize;

/// An original fetched from storage, with its decoded natural size.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub key: StorageKey,
    pub bytes: Bytes,
    pub dimensions: Dimensions,
}

/// An encoded derivative ready to hand to storage.
#[derive(Debug, Clone)]
pub struct Derivative {
    pub key: StorageKey,
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// What was written for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenDerivative {
    pub size: String,
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

impl WrittenDerivative {
    pub fn from_derivative(size: &str, derivative: &Derivative) -> Self {
        Self {
            size: size.to_string(),
            key: derivative.key.to_string(),
            width: derivative.width,
            height: derivative.height,
            bytes: derivative.bytes.len(),
        }
    }
}

/// What the delete path did for one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedDerivative {
    pub size: String,
    pub key: String,
    /// The object was already gone; counted as success.
    pub already_absent: bool,
}
