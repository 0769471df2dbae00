//! Read-only, memory-mapped reader for concatenated tzdata files
//!
//! The Olson time-zone rules are concatenated into a single database file
//! with a sorted index of zone ids and byte offsets. This crate maps that
//! file read-only, parses the index, and exposes binary-search lookup by id
//! plus a small cache of constructed zone objects.
//!
//! Loading degrades gracefully: candidate paths are tried in order, and if
//! none parses, a single-entry GMT fallback database is used so lookups
//! always have somewhere to go.

pub mod buffer;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod index;
pub mod zone;

pub use config::TzDataConfig;
pub use database::TzData;
pub use error::{Result, TzDataError};
pub use index::TzIndex;
pub use zone::{TzfileCompiler, ZoneCompiler, ZoneInfo};
