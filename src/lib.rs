//! # Album Resizer
//!
//! Event-driven derivative generation for photo albums kept in object
//! storage. Originals live at `{album}/full/{file}`; every upload produces a
//! resized JPEG per configured size at `{album}/{size}/{file}`, and deleting
//! the original deletes those derivatives again.
//!
//! # Architecture
//!
//! ```text
//! S3 event document ─→ notification ─→ pipeline::dispatch ─┬→ put    ─→ imaging ─→ storage.put
//!   (stdin / SQS)                                          ├→ delete ─────────────→ storage.delete
//!                                                          └→ metadata ─→ EXIF tags ─→ log
//! ```
//!
//! Storage and the image codec are traits ([`storage::ObjectStore`],
//! [`imaging::ImageBackend`]) injected into [`pipeline::Pipeline`], so the
//! routing and fan-out logic is tested without S3 or real pixels.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`key`] | `container/variant/file` key codec, event-key decoding |
//! | [`catalog`] | Ordered, validated derivative size catalog |
//! | [`imaging`] | Dimension math, codec backend trait, `image`-crate backend, EXIF |
//! | [`notification`] | S3 event documents and the `EventKind` enum |
//! | [`storage`] | `ObjectStore` trait and its S3 implementation |
//! | [`pipeline`] | Routing, put/delete handlers, fan-out, EXIF reporting |
//! | [`listener`] | SQS long-poll loop |
//! | [`config`] | `album-resizer.toml` loading, merging, and validation |
//! | [`report`] | CLI output formatting |
//! | [`types`] | Values passed between pipeline stages |
//!
//! # Design Decisions
//!
//! ## Originals Only
//!
//! Only keys whose middle segment is `full` trigger generation. Derivatives
//! are written into the same bucket, so their own upload notifications come
//! straight back; they are recognised by their variant and ignored.
//!
//! ## No Rollback
//!
//! Sizes are generated concurrently and the first failure fails the
//! notification. Siblings that were already written are left in place:
//! output is deterministic, so redelivery overwrites them with the same
//! bytes.
//!
//! ## Independent Paths
//!
//! The derivative and EXIF paths both run for every notification. A key the
//! derivative path rejects (say `sunset.jpg` at the bucket root) still has
//! its tags logged, and a failed EXIF read never blocks derivative writes.
//!
//! ## Catalog as Config
//!
//! Sizes come from `[[sizes]]` entries in the config file, so adding a size
//! needs no rebuild. The catalog drives both generation and deletion, so a
//! size removed from config is no longer cleaned up on delete.

pub mod catalog;
pub mod config;
pub mod imaging;
pub mod key;
pub mod listener;
pub mod notification;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;
