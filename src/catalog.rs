//! The ordered catalog of derivative sizes.
//!
//! Each [`SizeSpec`] names a derivative (`thumb`, `small`, ...) and bounds its
//! longer edge. The catalog is loaded once from config and never mutated;
//! its order is the order derivatives are generated, written, and deleted.

use crate::key::{DELIMITER, FULL_MARKER};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("size catalog must not be empty")]
    Empty,
    #[error("size name must not be empty")]
    EmptyName,
    #[error("size name {0:?} is reserved for originals")]
    ReservedName(String),
    #[error("size name {0:?} must not contain '/'")]
    InvalidName(String),
    #[error("size name {0:?} appears more than once")]
    DuplicateName(String),
    #[error("size {0:?} must have a max_dimension greater than 0")]
    ZeroDimension(String),
}

/// A named derivative size bounded on its longer edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeSpec {
    pub name: String,
    pub max_dimension: u32,
}

impl SizeSpec {
    pub fn new(name: impl Into<String>, max_dimension: u32) -> Self {
        Self {
            name: name.into(),
            max_dimension,
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if self.name == FULL_MARKER {
            return Err(CatalogError::ReservedName(self.name.clone()));
        }
        if self.name.contains(DELIMITER) {
            return Err(CatalogError::InvalidName(self.name.clone()));
        }
        if self.max_dimension == 0 {
            return Err(CatalogError::ZeroDimension(self.name.clone()));
        }
        Ok(())
    }
}

/// Validated, ordered collection of [`SizeSpec`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeCatalog {
    entries: Vec<SizeSpec>,
}

impl SizeCatalog {
    pub fn new(entries: Vec<SizeSpec>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for spec in &entries {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(CatalogError::DuplicateName(spec.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[SizeSpec] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SizeSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SizeCatalog {
    fn default() -> Self {
        Self {
            entries: default_sizes(),
        }
    }
}

impl<'a> IntoIterator for &'a SizeCatalog {
    type Item = &'a SizeSpec;
    type IntoIter = std::slice::Iter<'a, SizeSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Stock catalog: a single 256px thumbnail.
pub fn default_sizes() -> Vec<SizeSpec> {
    vec![SizeSpec::new("thumb", 256)]
}
