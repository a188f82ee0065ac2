// src/lib.rs
//! Wind sensor calibration recorder
//!
//! Reads NMEA 0183 sentences from several serial devices at once and logs
//! correlated (GPS speed, wind speed) pairs whenever the GPS ground speed
//! holds stable, for an offline curve fit against the wind sensor.

pub mod config;
pub mod correlate;
pub mod error;
pub mod nmea;
pub mod recorder;
pub mod serial;

// Re-export main types for convenience
pub use config::CalConfig;
pub use correlate::{Correlator, LogRecord};
pub use error::{CalError, Result};
pub use recorder::CalibrationRecorder;
pub use serial::NmeaLineSource;
