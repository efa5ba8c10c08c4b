//! EXIF extraction.
//!
//! Reading goes through `kamadak-exif`, which understands JPEG, TIFF, PNG,
//! WebP and HEIF containers. Derivatives get the source's raw TIFF-structured
//! block back through the JPEG encoder (see
//! [`RustBackend`](super::rust_backend::RustBackend)).

use super::backend::{BackendError, ExifTags};
use std::io::Cursor;
use tracing::debug;

/// Sources in a container `kamadak-exif` does not know, or carrying no EXIF,
/// yield `None`.
fn read_container(source: &[u8]) -> Result<Option<exif::Exif>, BackendError> {
    match exif::Reader::new().read_from_container(&mut Cursor::new(source)) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(exif::Error::InvalidFormat(reason) | exif::Error::NotSupported(reason)) => {
            debug!(reason, "no readable EXIF container");
            Ok(None)
        }
        Err(e) => Err(BackendError::ProcessingFailed(format!(
            "Failed to read EXIF: {e}"
        ))),
    }
}

/// Decode every EXIF field into a tag-name → display-value map.
///
/// Primary-image fields use the bare tag name (`DateTimeOriginal`); fields
/// from other IFDs are prefixed with their index (`ifd1.ImageWidth`).
pub fn read_tags(source: &[u8]) -> Result<ExifTags, BackendError> {
    let Some(exif) = read_container(source)? else {
        return Ok(ExifTags::new());
    };

    let mut tags = ExifTags::new();
    for field in exif.fields() {
        let name = if field.ifd_num == exif::In::PRIMARY {
            field.tag.to_string()
        } else {
            format!("ifd{}.{}", field.ifd_num.index(), field.tag)
        };
        let value = field.display_value().with_unit(&exif).to_string();
        tags.entry(name).or_insert(value);
    }
    Ok(tags)
}

/// The raw TIFF-structured EXIF block, if the source carries one.
pub fn raw_block(source: &[u8]) -> Option<Vec<u8>> {
    read_container(source)
        .ok()
        .flatten()
        .map(|exif| exif.buf().to_vec())
}
