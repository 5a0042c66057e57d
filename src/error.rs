//! Error handling for the ddgs application
//!
//! This module provides a hierarchical error system with user-friendly
//! messages. Command handlers work with `anyhow::Result` and the top-level
//! dispatcher converts into `DdgsError` before the process exits.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DdgsError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("File system error: {0}")]
    FileSystem(#[from] FileSystemError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Chat cache error: {0}")]
    ChatCache(#[from] ChatCacheError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Image pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API rate limit exceeded")]
    RateLimit,

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Timeout exceeded")]
    Timeout,
}

#[derive(Error, Debug)]
pub enum FileSystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to determine project directories")]
    ProjectDirs,
}

#[derive(Error, Debug)]
pub enum ChatCacheError {
    #[error("Failed to read cache {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed cache {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("Invalid value for --{option}: {reason}")]
    InvalidArgument { option: String, reason: String },

    #[error("Missing required option --{option}")]
    MissingArgument { option: String },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{failed} of {total} downloads failed; first failure: {first_error}")]
    DownloadsFailed {
        failed: usize,
        total: usize,
        first_error: String,
        /// Completed tasks the progress indicator recorded
        progress_ticks: u64,
    },

    #[error("Download worker panicked: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, DdgsError>;

impl From<std::io::Error> for DdgsError {
    fn from(err: std::io::Error) -> Self {
        DdgsError::FileSystem(FileSystemError::Io(err))
    }
}

impl From<reqwest::Error> for DdgsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DdgsError::Network(NetworkError::Timeout)
        } else {
            DdgsError::Network(NetworkError::Http(err))
        }
    }
}

impl From<toml::de::Error> for DdgsError {
    fn from(err: toml::de::Error) -> Self {
        DdgsError::Config(ConfigError::InvalidFormat(err))
    }
}

impl From<tokio::task::JoinError> for DdgsError {
    fn from(err: tokio::task::JoinError) -> Self {
        DdgsError::Pipeline(PipelineError::Worker(err.to_string()))
    }
}
