//! External services integration
//!
//! This module contains integrations with external APIs and services:
//! - the search client contract and its DuckDuckGo implementation
//! - the HTTP downloader used by the image pipeline

pub mod download;
pub mod duckduckgo;
pub mod search;

// Re-export main types
pub use download::{DownloadTask, Downloader, HttpDownloader};
pub use duckduckgo::DuckDuckGoClient;
pub use search::{
    ChatMessage, ChatModel, ImageResult, ImageStream, ImagesQuery, NewsQuery, SearchClient, SessionState,
    TextQuery,
};
