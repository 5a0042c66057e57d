//! Core functionality modules
//!
//! This module contains all core business logic organized into logical layers:
//! - `services`: the search client and downloader seams
//! - `images`: the concurrent image acquisition pipeline
//! - `files`: metadata scrubbing and duplicate removal
//! - `chat`: interactive chat sessions
//! - `infrastructure`: cross-cutting concerns (chat cache)

pub mod chat;
pub mod files;
pub mod images;
pub mod infrastructure;
pub mod services;
