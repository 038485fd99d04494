//! Storage layer backed by sled.
//!
//! One tree per entity type, keyed by 16-byte entity ID, holding encoded
//! rows. The query layer only scans types and fetches rows by ID; all
//! filtering happens above storage.

mod codec;
mod config;
mod engine;

pub use codec::{decode_row, encode_row};
pub use config::StorageConfig;
pub use engine::StorageEngine;
