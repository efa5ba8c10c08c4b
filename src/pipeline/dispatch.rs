//! Routing decisions for a single notification.
//!
//! Both pipelines decide what to do from the notification alone, before any
//! storage call is made:
//!
//! ```text
//! derivatives:  key ends in '/'    → Ignored(DirectoryMarker)
//!               decode key         → MalformedKey error if not 3 segments
//!               variant ≠ full     → Ignored(NotOriginal)
//!               ObjectCreated:Put  → Put
//!               ObjectRemoved:Delete → Delete
//!               other event        → Ignored(UnsupportedEvent)
//!
//! metadata:     extension not image/* → Ignored(NotAnImage)
//!               event ≠ ObjectCreated:Put → Ignored(UnsupportedEvent)
//!               key ends in '/'    → Ignored(DirectoryMarker)
//!               otherwise          → Report(decoded key)
//! ```

use super::IgnoreReason;
use crate::key::{DELIMITER, KeyError, StorageKey, decode_event_key};
use crate::notification::{EventKind, Notification};
use mime_guess::{Mime, mime};

/// Where the derivative pipeline sends a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Ignored(IgnoreReason),
    Put(StorageKey),
    Delete(StorageKey),
}

pub fn route(notification: &Notification) -> Result<Route, KeyError> {
    if notification.raw_key.ends_with(DELIMITER) {
        return Ok(Route::Ignored(IgnoreReason::DirectoryMarker));
    }

    let key = StorageKey::decode(&notification.raw_key)?;
    if !key.is_original() {
        return Ok(Route::Ignored(IgnoreReason::NotOriginal {
            variant: key.variant.to_string(),
        }));
    }

    Ok(match &notification.event {
        EventKind::ObjectCreatedPut => Route::Put(key),
        EventKind::ObjectRemovedDelete => Route::Delete(key),
        EventKind::Other(name) => Route::Ignored(IgnoreReason::UnsupportedEvent(name.clone())),
    })
}

/// Where the EXIF reporting pipeline sends a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataRoute {
    Ignored(IgnoreReason),
    /// Fetch and report the object at this decoded key.
    Report(String),
}

pub fn route_metadata(notification: &Notification) -> Result<MetadataRoute, KeyError> {
    let key = decode_event_key(&notification.raw_key)?;

    if !is_image_key(&key) {
        return Ok(MetadataRoute::Ignored(IgnoreReason::NotAnImage));
    }
    if notification.event != EventKind::ObjectCreatedPut {
        return Ok(MetadataRoute::Ignored(IgnoreReason::UnsupportedEvent(
            notification.event.to_string(),
        )));
    }
    if key.ends_with(DELIMITER) {
        return Ok(MetadataRoute::Ignored(IgnoreReason::DirectoryMarker));
    }
    Ok(MetadataRoute::Report(key))
}

/// Content type inferred from the key's extension.
pub fn inferred_content_type(key: &str) -> Option<Mime> {
    mime_guess::from_path(key).first()
}

/// Any `image/*` type counts, including ones no codec here can decode.
pub fn is_image_key(key: &str) -> bool {
    inferred_content_type(key).is_some_and(|guess| guess.type_() == mime::IMAGE)
}
