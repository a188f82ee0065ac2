// src/correlate.rs
//! Stability-gated correlation of GPS ground speed with wind speed

use std::fmt;

/// GPS speeds at or below this are too slow to calibrate against
const MIN_REFERENCE_KNOTS: f64 = 2.0;
/// Relative deviation that clears the stability window (maneuver/outlier)
const MAX_DEVIATION: f64 = 0.35;
/// Consecutive compatible fixes required before a pair may be logged
const STABLE_WINDOW_LEN: usize = 4;

/// One correlated calibration pair, immutable once emitted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub gps_speed_knots: f64,
    pub wind_speed_knots: f64,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.gps_speed_knots, self.wind_speed_knots)
    }
}

/// Pairs stable GPS speeds with the most recent wind sample.
///
/// Owns the rolling window of accepted GPS speeds and the single
/// pending-wind slot; the recorder loop holds exactly one instance.
#[derive(Debug, Default)]
pub struct Correlator {
    window: Vec<f64>,
    pending_wind: Option<f64>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a wind speed; only the latest sample between GPS fixes is kept.
    pub fn observe_wind_sample(&mut self, speed_knots: f64) {
        self.pending_wind = Some(speed_knots);
    }

    /// Feed one valid GPS ground speed; returns a pair when the speed has
    /// been stable long enough and a fresh wind sample is pending.
    pub fn observe_gps_fix(&mut self, speed_knots: f64) -> Option<LogRecord> {
        if speed_knots <= MIN_REFERENCE_KNOTS {
            return None;
        }

        // Any buffered member deviating too far means the boat maneuvered;
        // the window restarts from this fix.
        if self
            .window
            .iter()
            .any(|&prior| (1.0 - prior / speed_knots).abs() > MAX_DEVIATION)
        {
            println!("gps clear at {} ({} buffered)", speed_knots, self.window.len());
            self.window.clear();
        }
        self.window.push(speed_knots);

        let record = if self.window.len() >= STABLE_WINDOW_LEN {
            // Pair the incoming speed, not a window average
            self.pending_wind.map(|wind_speed_knots| LogRecord {
                gps_speed_knots: speed_knots,
                wind_speed_knots,
            })
        } else {
            None
        };

        // A pair always needs a wind reading newer than the last GPS fix
        self.pending_wind = None;
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatible_speed_extends_window() {
        let mut correlator = Correlator::new();
        correlator.observe_gps_fix(10.0);
        // 1 - 10/14 = 0.2857, inside the 0.35 limit
        correlator.observe_gps_fix(14.0);
        assert_eq!(correlator.window, vec![10.0, 14.0]);
    }

    #[test]
    fn test_outlier_clears_window() {
        let mut correlator = Correlator::new();
        correlator.observe_gps_fix(10.0);
        // 1 - 10/20 = 0.5, outside the limit: window restarts
        correlator.observe_gps_fix(20.0);
        assert_eq!(correlator.window, vec![20.0]);
    }

    #[test]
    fn test_deviation_checked_against_every_member() {
        let mut correlator = Correlator::new();
        correlator.observe_gps_fix(4.0);
        correlator.observe_gps_fix(5.0);
        correlator.observe_gps_fix(6.0);
        // 7.0 is fine against 6.0 but 1 - 4/7 = 0.43 against the oldest
        correlator.observe_gps_fix(7.0);
        assert_eq!(correlator.window, vec![7.0]);
    }

    #[test]
    fn test_slow_fix_ignored_entirely() {
        let mut correlator = Correlator::new();
        correlator.observe_wind_sample(8.2);
        assert_eq!(correlator.observe_gps_fix(2.0), None);
        assert!(correlator.window.is_empty());
        // A slow fix must not consume the pending wind sample
        assert_eq!(correlator.pending_wind, Some(8.2));
    }

    #[test]
    fn test_emission_requires_stable_window_and_fresh_wind() {
        let mut correlator = Correlator::new();
        assert_eq!(correlator.observe_gps_fix(10.0), None);
        assert_eq!(correlator.observe_gps_fix(10.2), None);
        assert_eq!(correlator.observe_gps_fix(10.1), None);
        correlator.observe_wind_sample(8.2);
        let record = correlator.observe_gps_fix(10.3);
        assert_eq!(
            record,
            Some(LogRecord {
                gps_speed_knots: 10.3,
                wind_speed_knots: 8.2,
            })
        );
    }

    #[test]
    fn test_pending_wind_cleared_after_every_fix() {
        let mut correlator = Correlator::new();
        correlator.observe_wind_sample(8.2);
        for speed in [10.0, 10.2, 10.1] {
            correlator.observe_gps_fix(speed);
        }
        // The wind sample was consumed by the first fix; nothing pends now
        assert_eq!(correlator.observe_gps_fix(10.3), None);

        correlator.observe_wind_sample(8.4);
        assert!(correlator.observe_gps_fix(10.2).is_some());
        // No new wind since: the window is still long enough but no pair
        assert_eq!(correlator.observe_gps_fix(10.1), None);
    }

    #[test]
    fn test_latest_wind_sample_wins() {
        let mut correlator = Correlator::new();
        for speed in [10.0, 10.2, 10.1] {
            correlator.observe_gps_fix(speed);
        }
        correlator.observe_wind_sample(7.0);
        correlator.observe_wind_sample(8.2);
        let record = correlator.observe_gps_fix(10.3).unwrap();
        assert_eq!(record.wind_speed_knots, 8.2);
    }

    #[test]
    fn test_record_line_format() {
        let record = LogRecord {
            gps_speed_knots: 5.3,
            wind_speed_knots: 8.2,
        };
        assert_eq!(record.to_string(), "5.3, 8.2");
    }
}
