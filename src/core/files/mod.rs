//! File operations on a download directory
//!
//! - `metadata`: stripping embedded metadata with an external tool
//! - `dedup`: removing byte-identical files

pub mod dedup;
pub mod metadata;

// Re-export main types
pub use dedup::{remove_duplicates, DuplicateRemoval};
pub use metadata::{MetadataScrubber, ScrubReport};
