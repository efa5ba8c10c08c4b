//! Storage key codec for the `container/variant/file` layout.
//!
//! Every object the pipeline cares about lives at a three-segment key:
//!
//! ```text
//! vacation/full/sunset.jpg     ← original (variant = "full")
//! vacation/thumb/sunset.jpg    ← derivative (variant = size name)
//! ```
//!
//! Derivative keys are always computed from a source key by swapping the
//! middle segment, so the container and file name survive untouched.
//!
//! ## Event key encoding
//!
//! Keys arriving in storage notifications are form-encoded: spaces become
//! `+` and everything else unsafe is percent-encoded. [`StorageKey::decode`]
//! undoes both before splitting. This is the notification payload's quirk,
//! not general URL semantics, so a literal `+` in a file name arrives as
//! `%2B` and decodes back to `+`.

use std::fmt;
use thiserror::Error;

/// Segment separator inside a storage key.
pub const DELIMITER: char = '/';

/// Literal marker for the variant segment of original uploads.
pub const FULL_MARKER: &str = "full";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed key {key:?}: expected 3 segments, found {segments}")]
    MalformedKey { key: String, segments: usize },
    #[error("key {key:?} is not valid percent-encoded UTF-8")]
    InvalidEncoding { key: String },
}

/// Middle segment of a key: the original or a named derivative size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variant {
    Full,
    Size(String),
}

impl Variant {
    pub fn parse(segment: &str) -> Self {
        if segment == FULL_MARKER {
            Variant::Full
        } else {
            Variant::Size(segment.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Variant::Full => FULL_MARKER,
            Variant::Size(name) => name,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded `container/variant/file` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    pub container: String,
    pub variant: Variant,
    pub file_name: String,
}

/// Undo the notification encoding: `+` → space, then percent-decoding.
pub fn decode_event_key(raw: &str) -> Result<String, KeyError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| KeyError::InvalidEncoding {
            key: raw.to_string(),
        })
}

impl StorageKey {
    pub fn new(container: &str, variant: Variant, file_name: &str) -> Self {
        Self {
            container: container.to_string(),
            variant,
            file_name: file_name.to_string(),
        }
    }

    /// Decode a raw notification key into its three segments.
    ///
    /// - `"vacation/full/sunset.jpg"` → container `vacation`, variant `Full`, file `sunset.jpg`
    /// - `"my+trip/full/day%201.jpg"` → container `my trip`, file `day 1.jpg`
    /// - `"vacation/sunset.jpg"` → [`KeyError::MalformedKey`]
    pub fn decode(raw: &str) -> Result<Self, KeyError> {
        let decoded = decode_event_key(raw)?;
        let segments: Vec<&str> = decoded.split(DELIMITER).collect();
        match segments.as_slice() {
            [container, variant, file_name] => Ok(Self::new(
                container,
                Variant::parse(variant),
                file_name,
            )),
            _ => Err(KeyError::MalformedKey {
                key: raw.to_string(),
                segments: segments.len(),
            }),
        }
    }

    /// Same container and file name, variant replaced by `variant_name`.
    pub fn derive(&self, variant_name: &str) -> Self {
        Self {
            container: self.container.clone(),
            variant: Variant::parse(variant_name),
            file_name: self.file_name.clone(),
        }
    }

    pub fn is_original(&self) -> bool {
        self.variant == Variant::Full
    }

    /// Encode the key the way storage notifications deliver it.
    pub fn to_event_key(&self) -> String {
        [
            self.container.as_str(),
            self.variant.as_str(),
            self.file_name.as_str(),
        ]
        .iter()
        .map(|segment| urlencoding::encode(segment).replace("%20", "+"))
        .collect::<Vec<_>>()
        .join("/")
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.container, self.variant, self.file_name
        )
    }
}
