use std::env;
use crate::error::{Result, DdgsError};

/// Environment variable configuration constants
pub struct EnvVars;

impl EnvVars {
    pub const PROXY: &'static str = "DDGS_PROXY";
    pub const DOWNLOAD_THREADS: &'static str = "DDGS_DOWNLOAD_THREADS";
    pub const CHAT_TIMEOUT_SECONDS: &'static str = "DDGS_CHAT_TIMEOUT_SECONDS";
    pub const REQUEST_TIMEOUT_SECONDS: &'static str = "DDGS_REQUEST_TIMEOUT_SECONDS";
    pub const EXIFTOOL_PATH: &'static str = "DDGS_EXIFTOOL_PATH";
    pub const DELETE_UNSCRUBBED: &'static str = "DDGS_DELETE_UNSCRUBBED";
}

/// Environment variable parsing utilities with validation
pub struct EnvParser;

impl EnvParser {
    /// Parse environment variable as string with validation
    pub fn parse_string(var_name: &str, validator: Option<fn(&str) -> Result<()>>) -> Result<Option<String>> {
        match env::var(var_name) {
            Ok(value) => {
                let trimmed = value.trim().to_string();
                if trimmed.is_empty() {
                    return Ok(None);
                }

                if let Some(validate_fn) = validator {
                    validate_fn(&trimmed)?;
                }

                Ok(Some(trimmed))
            }
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(DdgsError::Validation(format!(
                    "Environment variable {} contains invalid UTF-8",
                    var_name
                )))
            }
        }
    }

    /// Parse environment variable as boolean with validation
    pub fn parse_bool(var_name: &str) -> Result<Option<bool>> {
        if let Some(value_str) = Self::parse_string(var_name, None)? {
            match value_str.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(DdgsError::Validation(format!(
                    "Invalid boolean value in {}: '{}'. Use: true/false, 1/0, yes/no, on/off",
                    var_name, value_str
                )))
            }
        } else {
            Ok(None)
        }
    }

    /// Parse environment variable as u64 with range validation
    pub fn parse_u64(var_name: &str, min: u64, max: u64) -> Result<Option<u64>> {
        Self::parse_number(var_name, min, max)
    }

    /// Parse environment variable as usize with range validation
    pub fn parse_usize(var_name: &str, min: usize, max: usize) -> Result<Option<usize>> {
        Self::parse_number(var_name, min, max)
    }

    fn parse_number<T>(var_name: &str, min: T, max: T) -> Result<Option<T>>
    where
        T: std::str::FromStr + PartialOrd + std::fmt::Display + Copy,
    {
        let Some(value_str) = Self::parse_string(var_name, None)? else {
            return Ok(None);
        };

        let value = value_str.parse::<T>().map_err(|_| {
            DdgsError::Validation(format!(
                "Invalid number in {}: '{}'. Must be a positive integer",
                var_name, value_str
            ))
        })?;

        if value < min || value > max {
            return Err(DdgsError::Validation(format!(
                "Value in {} must be between {} and {}, got {}",
                var_name, min, max, value
            )));
        }

        Ok(Some(value))
    }
}
