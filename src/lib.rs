//! fscache - A filesystem-backed key/value cache
//!
//! Entries live at `<root>/<key>.cache` with their modification time as the
//! sole timestamp of record. Writes are coordinated through sibling dogpile
//! marker files so that at most one writer per expiry window pays the
//! regeneration cost.

pub mod cache;
pub mod config;
pub mod error;
pub mod fsio;

pub use cache::{CacheStore, Lookup, SaveOutcome, StatsSnapshot};
pub use config::Config;
pub use error::{CacheError, Result};
