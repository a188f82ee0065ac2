// src/recorder.rs
//! Sweep loop coordination: routes sentences from every line source through
//! the parser and correlator, and appends emitted pairs to the wind log

use crate::{
    config::{CalConfig, ConfiguredDevice},
    correlate::{Correlator, LogRecord},
    error::{CalError, Result},
    nmea::{self, Parsed},
    serial::NmeaLineSource,
};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Calibration needs one GPS stream and one wind stream
const MIN_PORTS: usize = 2;

/// Append-only calibration log, one "<gps speed>, <wind speed>" per line.
#[derive(Debug)]
pub struct WindLogFile {
    path: PathBuf,
    file: File,
}

impl WindLogFile {
    /// Create a log in `dir`, named from the startup timestamp. The
    /// offline fit tool picks it up by the wind_*.log pattern.
    pub fn create(dir: &Path) -> Result<Self> {
        let stamp = chrono::Local::now().format("%Y-%m-%d_%H:%M:%S");
        let path = dir.join(format!("wind_{}.log", stamp));
        let file = File::create(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and push it to disk.
    pub fn append(&mut self, record: &LogRecord) -> Result<()> {
        writeln!(self.file, "{}", record)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

/// Feed one raw sentence through checksum check, parsers, and correlator.
///
/// Checksum mismatches are dropped silently. Parse failures are reported
/// and dropped. Sentences neither parser recognizes are ignored.
pub fn process_sentence(correlator: &mut Correlator, line: &str) -> Option<LogRecord> {
    if !nmea::verify_checksum(line) {
        return None;
    }

    // Wind first, then GPS, same as the sweep has always ordered them
    match nmea::parse_wind_sample(line) {
        Parsed::Value(sample) => {
            println!("wspd {}", sample.speed_knots);
            correlator.observe_wind_sample(sample.speed_knots);
            return None;
        }
        Parsed::Failed(reason) => {
            eprintln!("nmea failed to parse wind: {}", reason);
            return None;
        }
        Parsed::NotApplicable => {}
    }

    match nmea::parse_gps_fix(line) {
        Parsed::Value(fix) => {
            println!("speed {}", fix.speed_knots);
            correlator.observe_gps_fix(fix.speed_knots)
        }
        Parsed::Failed(reason) => {
            eprintln!("nmea failed to parse gps: {}", reason);
            None
        }
        Parsed::NotApplicable => None,
    }
}

/// Owns the line sources, the correlator state, and the log file, and
/// drives the polling loop until shutdown.
#[derive(Debug)]
pub struct CalibrationRecorder {
    sources: Vec<NmeaLineSource>,
    correlator: Correlator,
    log: WindLogFile,
    sweep_interval: Duration,
}

impl CalibrationRecorder {
    /// Open every configured device and the log file.
    ///
    /// Devices that fail to open are reported individually and skipped;
    /// ending up with fewer than two open sources is fatal.
    pub fn open(
        devices: &[ConfiguredDevice],
        config: &CalConfig,
        log_dir: &Path,
    ) -> Result<Self> {
        let mut sources = Vec::new();
        for device in devices {
            match NmeaLineSource::open(&device.path, device.baud_rate) {
                Ok(source) => sources.push(source),
                Err(e) => eprintln!("{}", e),
            }
        }

        println!("found {} ports", sources.len());
        if sources.len() < MIN_PORTS {
            return Err(CalError::InsufficientPorts(sources.len()));
        }

        let log = WindLogFile::create(log_dir)?;
        println!("file {}", log.path().display());

        Ok(Self {
            sources,
            correlator: Correlator::new(),
            log,
            sweep_interval: Duration::from_millis(config.sweep_interval_ms),
        })
    }

    /// Poll until Ctrl+C: drain each source in a fixed order, route every
    /// sentence, then throttle before the next sweep.
    pub async fn run(&mut self) -> Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            self.sweep().await?;
            tokio::select! {
                _ = &mut ctrl_c => break,
                _ = tokio::time::sleep(self.sweep_interval) => {}
            }
        }

        println!("\nShutting down...");
        self.shutdown()
    }

    /// One round-robin pass: drain each source until it has no complete
    /// sentence left. A read error on one source does not abort the sweep.
    async fn sweep(&mut self) -> Result<()> {
        for source in &mut self.sources {
            loop {
                match source.read_line().await {
                    Ok(Some(line)) => {
                        if let Some(record) = process_sentence(&mut self.correlator, &line) {
                            println!("log {}", record);
                            self.log.append(&record)?;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        eprintln!("Error reading from {}: {}", source.path(), e);
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        for source in &mut self.sources {
            source.close();
        }
        self.log.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(body: &str) -> String {
        format!("${}*{:02X}", body, nmea::checksum(body))
    }

    fn rmc(speed: &str) -> String {
        sentence(&format!(
            "GPRMC,123519,A,4807.038,N,01131.000,E,{},084.4,230394,003.1,W",
            speed
        ))
    }

    #[test]
    fn test_stable_run_emits_exactly_one_record() {
        let mut correlator = Correlator::new();

        for speed in ["5.0", "5.2", "5.1"] {
            assert_eq!(process_sentence(&mut correlator, &rmc(speed)), None);
        }
        // Wind arrives before the fourth fix
        let wind = sentence("WIMWV,180.0,R,7.9,N,A");
        assert_eq!(process_sentence(&mut correlator, &wind), None);

        let record = process_sentence(&mut correlator, &rmc("5.3")).unwrap();
        assert_eq!(record.to_string(), "5.3, 7.9");

        // No new wind sample, so the next stable fix pairs with nothing
        assert_eq!(process_sentence(&mut correlator, &rmc("5.2")), None);
    }

    #[test]
    fn test_checksum_mismatch_dropped_silently() {
        let mut correlator = Correlator::new();

        let mut corrupt = sentence("WIMWV,180.0,R,7.9,N,A");
        corrupt = corrupt.replace("180.0", "181.0");
        assert_eq!(process_sentence(&mut correlator, &corrupt), None);

        // The corrupt wind sample must not have been retained
        for speed in ["5.0", "5.2", "5.1", "5.3"] {
            assert_eq!(process_sentence(&mut correlator, &rmc(speed)), None);
        }
    }

    #[test]
    fn test_unrecognized_sentences_ignored() {
        let mut correlator = Correlator::new();
        let gga = sentence("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,");
        assert_eq!(process_sentence(&mut correlator, &gga), None);
        assert_eq!(process_sentence(&mut correlator, "not nmea at all"), None);
    }

    #[test]
    fn test_void_fix_keeps_pending_wind() {
        let mut correlator = Correlator::new();
        for speed in ["5.0", "5.2", "5.1"] {
            process_sentence(&mut correlator, &rmc(speed));
        }
        let wind = sentence("WIMWV,180.0,R,7.9,N,A");
        process_sentence(&mut correlator, &wind);

        // A void fix never reaches the correlator, so it must not consume
        // the pending wind sample
        let void = sentence("GPRMC,123519,V,4807.038,N,01131.000,E,5.0,084.4,230394,003.1,W");
        assert_eq!(process_sentence(&mut correlator, &void), None);

        let record = process_sentence(&mut correlator, &rmc("5.3")).unwrap();
        assert_eq!(record.to_string(), "5.3, 7.9");
    }

    #[test]
    fn test_log_line_round_trip() {
        let mut log = WindLogFile::create(&std::env::temp_dir()).unwrap();
        log.append(&LogRecord {
            gps_speed_knots: 5.3,
            wind_speed_knots: 8.2,
        })
        .unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let line = contents.lines().next().unwrap();
        let mut fields = line.split(", ");
        let gps: f64 = fields.next().unwrap().parse().unwrap();
        let wind: f64 = fields.next().unwrap().parse().unwrap();
        assert!((gps - 5.3).abs() < f64::EPSILON);
        assert!((wind - 8.2).abs() < f64::EPSILON);

        std::fs::remove_file(log.path()).ok();
    }

    #[test]
    fn test_no_devices_is_fatal_before_logging() {
        let config = CalConfig::default();
        let err = CalibrationRecorder::open(&[], &config, &std::env::temp_dir()).unwrap_err();
        assert!(matches!(err, CalError::InsufficientPorts(0)));
    }

    #[tokio::test]
    async fn test_one_unusable_device_is_fatal() {
        let config = CalConfig::default();
        let devices = vec![ConfiguredDevice {
            path: "/dev/wind-cal-no-such-device".to_string(),
            baud_rate: 4800,
        }];
        let err = CalibrationRecorder::open(&devices, &config, &std::env::temp_dir()).unwrap_err();
        assert!(matches!(err, CalError::InsufficientPorts(0)));
    }
}
