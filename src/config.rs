// src/config.rs
//! Device configuration: which serial devices to read and at what baud rate

use crate::error::{CalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalConfig {
    /// Resolved device path -> baud rate; detected devices without an
    /// entry here are ignored
    pub baud_rates: HashMap<String, u32>,
    /// Pause between polling sweeps, in milliseconds
    pub sweep_interval_ms: u64,
}

impl Default for CalConfig {
    fn default() -> Self {
        let mut baud_rates = HashMap::new();
        baud_rates.insert("/dev/ttyACM0".to_string(), 4800);
        baud_rates.insert("/dev/ttyUSB0".to_string(), 115200);
        Self {
            baud_rates,
            sweep_interval_ms: 100,
        }
    }
}

impl CalConfig {
    /// Load configuration from the given file, or the default location.
    /// A missing file yields the default device table.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| CalError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CalError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to its default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CalError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(&config_path, contents)
            .map_err(|e| CalError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn default_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| CalError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("wind-cal")
            .join("config.json"))
    }
}

/// A device that passed selection: present, resolved, and in the baud table.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfiguredDevice {
    pub path: String,
    pub baud_rate: u32,
}

/// Enumerate candidate serial ports on this machine.
pub fn discover_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Match discovered ports against the configured baud table.
///
/// Symlinked paths (/dev/serial/by-id and friends) are canonicalized first
/// so they match the real device path in the table. Detected devices with
/// no table entry are reported individually, then skipped.
pub fn select_devices(config: &CalConfig, candidates: &[String]) -> Vec<ConfiguredDevice> {
    let mut selected = Vec::new();
    let mut seen = HashSet::new();

    for name in candidates {
        let resolved = std::fs::canonicalize(name)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| name.clone());
        if !seen.insert(resolved.clone()) {
            continue;
        }
        match config.baud_rates.get(&resolved) {
            Some(&baud_rate) => {
                println!("using device {} at {} baud", resolved, baud_rate);
                selected.push(ConfiguredDevice {
                    path: resolved,
                    baud_rate,
                });
            }
            None => {
                println!("ignoring {}: no baud rate configured", resolved);
            }
        }
    }

    // Sweep order must be stable regardless of enumeration order
    selected.sort_by(|a, b| a.path.cmp(&b.path));
    selected
}

/// List every serial port the OS reports, configured or not.
pub fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}
