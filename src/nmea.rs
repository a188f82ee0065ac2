// src/nmea.rs
//! NMEA 0183 sentence parsing

/// km/h to knots
const KMH_TO_KNOTS: f64 = 0.53995;
/// m/s to knots
const MS_TO_KNOTS: f64 = 1.94384;

/// Ground-speed fix extracted from an RMC sentence
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    pub speed_knots: f64,
    pub track_degrees: Option<f64>,
}

/// Wind reading extracted from an MWV sentence, speed converted to knots
#[derive(Debug, Clone, PartialEq)]
pub struct WindSample {
    pub direction_deg: f64,
    pub speed_knots: f64,
}

/// Outcome of running one parser over a sentence
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Value(T),
    /// Sentence type not handled by this parser (or a void fix)
    NotApplicable,
    /// A required field was missing or malformed; the sentence is dropped
    Failed(String),
}

/// XOR checksum over every byte of the payload (the text between '$' and '*')
pub fn checksum(payload: &str) -> u8 {
    payload.bytes().fold(0, |value, b| value ^ b)
}

/// Verify the trailing hex checksum of a complete sentence.
///
/// Returns false for any malformed input: missing '$', missing '*',
/// or a non-hex checksum field.
pub fn verify_checksum(sentence: &str) -> bool {
    let rest = match sentence.strip_prefix('$') {
        Some(rest) => rest,
        None => return false,
    };
    let (payload, declared) = match rest.split_once('*') {
        Some(parts) => parts,
        None => return false,
    };
    match u8::from_str_radix(declared, 16) {
        Ok(value) => checksum(payload) == value,
        Err(_) => false,
    }
}

/// Split a sentence into comma-separated fields, dropping the "*HH" tail.
///
/// fields[0] is the "$TTSSS" address, so fields[n] lines up with NMEA
/// field number n.
fn split_fields(line: &str) -> Vec<&str> {
    let body = line.split('*').next().unwrap_or(line);
    body.split(',').collect()
}

/// Parse an RMC (recommended minimum) sentence into a ground-speed fix.
///
/// Void fixes (status 'V') are not applicable; they never reach the
/// correlator.
pub fn parse_gps_fix(line: &str) -> Parsed<GpsFix> {
    // Sentence type at the fixed offset past the talker id
    if line.get(3..6) != Some("RMC") {
        return Parsed::NotApplicable;
    }

    let fields = split_fields(line);

    // Status (field 2): 'A' = active, 'V' = void
    if fields.len() < 3 {
        return Parsed::Failed(format!("RMC sentence too short: {}", line));
    }
    if fields[2] == "V" {
        return Parsed::NotApplicable;
    }

    if fields.len() < 9 {
        return Parsed::Failed(format!("RMC sentence too short: {}", line));
    }

    // Speed over ground in knots (field 7), empty means stationary
    let speed_knots = if fields[7].is_empty() {
        0.0
    } else {
        match fields[7].parse::<f64>() {
            Ok(speed) => speed,
            Err(_) => return Parsed::Failed(format!("bad RMC speed {:?}: {}", fields[7], line)),
        }
    };

    // Track angle in degrees (field 8), optional
    let track_degrees = if fields[8].is_empty() {
        None
    } else {
        match fields[8].parse::<f64>() {
            Ok(track) => Some(track),
            Err(_) => return Parsed::Failed(format!("bad RMC track {:?}: {}", fields[8], line)),
        }
    };

    Parsed::Value(GpsFix {
        speed_knots,
        track_degrees,
    })
}

/// Parse an MWV (wind speed and angle) sentence.
///
/// Direction is mandatory: a sentence without a parsable wind angle
/// produces no sample at all. Speed is converted to knots from the unit
/// code in field 4.
pub fn parse_wind_sample(line: &str) -> Parsed<WindSample> {
    if line.get(3..6) != Some("MWV") {
        return Parsed::NotApplicable;
    }

    let fields = split_fields(line);

    // Wind angle (field 1)
    let direction_deg = match fields.get(1).and_then(|f| f.parse::<f64>().ok()) {
        Some(direction) => direction,
        None => return Parsed::Failed(format!("no wind direction: {}", line)),
    };

    // Speed (field 3) and unit code (field 4)
    if fields.len() < 5 {
        return Parsed::Failed(format!("MWV sentence too short: {}", line));
    }
    let raw_speed = match fields[3].parse::<f64>() {
        Ok(speed) => speed,
        Err(_) => return Parsed::Failed(format!("bad MWV speed {:?}: {}", fields[3], line)),
    };
    let speed_knots = match fields[4] {
        "K" => raw_speed * KMH_TO_KNOTS,
        "M" => raw_speed * MS_TO_KNOTS,
        _ => raw_speed, // 'N' and anything else is already knots
    };

    Parsed::Value(WindSample {
        direction_deg,
        speed_knots,
    })
}
