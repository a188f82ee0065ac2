// src/error.rs
//! Error types for the calibration recorder

use std::fmt;

pub type Result<T> = std::result::Result<T, CalError>;

#[derive(Debug)]
pub enum CalError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    DeviceUnavailable { path: String, reason: String },
    InsufficientPorts(usize),
    Config(String),
    Other(String),
}

impl fmt::Display for CalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalError::Io(e) => write!(f, "IO error: {}", e),
            CalError::Serial(e) => write!(f, "Serial error: {}", e),
            CalError::DeviceUnavailable { path, reason } => {
                write!(f, "Device {} unavailable: {}", path, reason)
            }
            CalError::InsufficientPorts(n) => {
                write!(f, "Not enough data ports: {} open, need at least 2", n)
            }
            CalError::Config(msg) => write!(f, "Config error: {}", msg),
            CalError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CalError {}

impl From<std::io::Error> for CalError {
    fn from(error: std::io::Error) -> Self {
        CalError::Io(error)
    }
}

impl From<tokio_serial::Error> for CalError {
    fn from(error: tokio_serial::Error) -> Self {
        CalError::Serial(error)
    }
}

impl From<serde_json::Error> for CalError {
    fn from(error: serde_json::Error) -> Self {
        CalError::Config(error.to_string())
    }
}
