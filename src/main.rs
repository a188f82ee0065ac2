// src/main.rs
//! Wind sensor calibration recorder CLI

use clap::Parser;
use std::path::PathBuf;
use wind_cal::{
    config::{self, CalConfig},
    CalError, CalibrationRecorder, Result,
};

/// Record correlated (GPS speed, wind speed) pairs from two live NMEA
/// serial streams for offline wind sensor calibration.
#[derive(Parser, Debug)]
#[command(name = "wind-cal", version, about)]
struct Args {
    /// Config file overriding the default device/baud table
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the wind_<timestamp>.log file is written to
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// List detected serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_ports {
        return config::list_serial_ports();
    }

    println!("wind sensor calibration");

    let config = CalConfig::load(args.config.as_deref())?;

    let candidates = config::discover_ports()?;
    if candidates.is_empty() {
        println!("no serial devices found");
        return Err(CalError::InsufficientPorts(0));
    }

    let devices = config::select_devices(&config, &candidates);
    let mut recorder = CalibrationRecorder::open(&devices, &config, &args.log_dir)?;
    recorder.run().await
}
