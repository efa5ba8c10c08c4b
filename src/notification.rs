//! S3 event notification documents.
//!
//! Only the fields the pipeline routes on are modelled. A document may carry
//! several records; test events (`s3:TestEvent`) carry none.
//!
//! ```json
//! {"Records": [{"eventName": "ObjectCreated:Put",
//!               "s3": {"bucket": {"name": "photos"},
//!                      "object": {"key": "vacation/full/sunset.jpg", "size": 1024}}}]}
//! ```

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3Record>,
}

#[derive(Debug, Deserialize)]
pub struct S3Record {
    #[serde(rename = "eventName")]
    pub event_name: String,
    pub s3: S3Entity,
}

#[derive(Debug, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// The event names the pipeline reacts to; everything else is carried as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    ObjectCreatedPut,
    ObjectRemovedDelete,
    Other(String),
}

impl EventKind {
    /// Accepts both bare (`ObjectCreated:Put`) and `s3:`-prefixed names.
    pub fn parse(name: &str) -> Self {
        match name.strip_prefix("s3:").unwrap_or(name) {
            "ObjectCreated:Put" => EventKind::ObjectCreatedPut,
            "ObjectRemoved:Delete" => EventKind::ObjectRemovedDelete,
            _ => EventKind::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::ObjectCreatedPut => "ObjectCreated:Put",
            EventKind::ObjectRemovedDelete => "ObjectRemoved:Delete",
            EventKind::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One storage change, as handed to the dispatcher.
///
/// `raw_key` is left exactly as delivered (form-encoded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub event: EventKind,
    pub bucket: String,
    pub raw_key: String,
    /// Object size in bytes; absent on delete records.
    pub size: Option<u64>,
}

impl Notification {
    pub fn new(event: EventKind, bucket: impl Into<String>, raw_key: impl Into<String>) -> Self {
        Self {
            event,
            bucket: bucket.into(),
            raw_key: raw_key.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

impl From<S3Record> for Notification {
    fn from(record: S3Record) -> Self {
        Self {
            event: EventKind::parse(&record.event_name),
            bucket: record.s3.bucket.name,
            raw_key: record.s3.object.key,
            size: record.s3.object.size,
        }
    }
}

impl S3Event {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn into_notifications(self) -> Vec<Notification> {
        self.records.into_iter().map(Notification::from).collect()
    }
}
