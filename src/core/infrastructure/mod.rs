//! Infrastructure and cross-cutting concerns
//!
//! - `chat_cache`: file persistence for chat session state

pub mod chat_cache;

pub use chat_cache::ChatCache;
