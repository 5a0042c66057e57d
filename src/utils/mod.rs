//! Utility modules for common functionality
//!
//! - `logging`: Logging configuration and setup
//! - `progress`: Progress bar utilities for consistent console feedback
//! - `output`: Printing and saving search results

pub mod logging;
pub mod output;
pub mod progress;
