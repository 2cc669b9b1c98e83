// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use skyscan_core::ScanError;
use std::f64::consts::PI;

/// Fixed width of a two-line element line, checksum included.
pub const TLE_LINE_LEN: usize = 69;

const MINUTES_PER_DAY: f64 = 1440.0;

/// Deterministic satellite state recovered from one element pair.
///
/// Angles stay in the degrees the lines carry; the propagation-model rate in
/// radians per minute is derived on demand via [`TleRecord::mean_motion_rad_min`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TleRecord {
    pub norad_id: u32,
    pub epoch_year: u32,
    pub epoch_day: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    pub mean_motion_rev_day: f64,
}

impl TleRecord {
    /// Mean-motion rate in radians per minute, the propagation model's
    /// internal unit. `rate * 1440 / (2 * pi)` recovers revolutions per day.
    pub fn mean_motion_rad_min(&self) -> f64 {
        self.mean_motion_rev_day * 2.0 * PI / MINUTES_PER_DAY
    }
}

/// Parses and validates a two-line element pair.
///
/// Rejects wrong lengths, non-ASCII content, wrong line-number prefixes,
/// checksum mismatches, mismatched catalog numbers, non-numeric fields, and
/// physically out-of-range elements. Callers treating records as optional
/// (the feature extractor) recover by skipping the entry.
pub fn parse_tle_pair(line1: &str, line2: &str) -> Result<TleRecord, ScanError> {
    validate_line(line1, 1)?;
    validate_line(line2, 2)?;

    let norad_line1 = parse_u32_field(line1, 2..7, "line 1 catalog number")?;
    let norad_line2 = parse_u32_field(line2, 2..7, "line 2 catalog number")?;
    if norad_line1 != norad_line2 {
        return Err(ScanError::invalid_input(format!(
            "TLE catalog numbers disagree: line 1 has {norad_line1}, line 2 has {norad_line2}"
        )));
    }

    let epoch_year_two_digit = parse_u32_field(line1, 18..20, "epoch year")?;
    // Same pivot the propagation model uses for two-digit epoch years.
    let epoch_year = if epoch_year_two_digit < 57 {
        2000 + epoch_year_two_digit
    } else {
        1900 + epoch_year_two_digit
    };
    let epoch_day = parse_f64_field(line1, 20..32, "epoch day")?;
    if !(0.0..=367.0).contains(&epoch_day) {
        return Err(ScanError::invalid_input(format!(
            "epoch day must be within [0, 367]; got {epoch_day}"
        )));
    }

    let inclination_deg = parse_f64_field(line2, 8..16, "inclination")?;
    if !(0.0..=180.0).contains(&inclination_deg) {
        return Err(ScanError::invalid_input(format!(
            "inclination must be within [0, 180] degrees; got {inclination_deg}"
        )));
    }

    let raan_deg = parse_f64_field(line2, 17..25, "right ascension")?;
    let eccentricity = parse_implied_decimal_field(line2, 26..33, "eccentricity")?;
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(ScanError::invalid_input(format!(
            "eccentricity must be within [0, 1); got {eccentricity}"
        )));
    }

    let arg_perigee_deg = parse_f64_field(line2, 34..42, "argument of perigee")?;
    let mean_anomaly_deg = parse_f64_field(line2, 43..51, "mean anomaly")?;
    let mean_motion_rev_day = parse_f64_field(line2, 52..63, "mean motion")?;
    if !mean_motion_rev_day.is_finite() || mean_motion_rev_day <= 0.0 {
        return Err(ScanError::invalid_input(format!(
            "mean motion must be > 0 rev/day; got {mean_motion_rev_day}"
        )));
    }

    Ok(TleRecord {
        norad_id: norad_line1,
        epoch_year,
        epoch_day,
        inclination_deg,
        raan_deg,
        eccentricity,
        arg_perigee_deg,
        mean_anomaly_deg,
        mean_motion_rev_day,
    })
}

fn validate_line(line: &str, ordinal: u8) -> Result<(), ScanError> {
    if !line.is_ascii() {
        return Err(ScanError::invalid_input(format!(
            "TLE line {ordinal} must be ASCII"
        )));
    }
    if line.len() != TLE_LINE_LEN {
        return Err(ScanError::invalid_input(format!(
            "TLE line {ordinal} must be {TLE_LINE_LEN} characters; got {}",
            line.len()
        )));
    }

    let expected_prefix = char::from(b'0' + ordinal);
    let prefix = line.as_bytes()[0] as char;
    if prefix != expected_prefix {
        return Err(ScanError::invalid_input(format!(
            "TLE line {ordinal} must start with '{expected_prefix}'; got '{prefix}'"
        )));
    }

    let declared = line.as_bytes()[TLE_LINE_LEN - 1];
    if !declared.is_ascii_digit() {
        return Err(ScanError::invalid_input(format!(
            "TLE line {ordinal} checksum column must be a digit; got '{}'",
            declared as char
        )));
    }
    let computed = line_checksum(&line[..TLE_LINE_LEN - 1]);
    if computed != declared - b'0' {
        return Err(ScanError::invalid_input(format!(
            "TLE line {ordinal} checksum mismatch: declared {}, computed {computed}",
            declared - b'0'
        )));
    }

    Ok(())
}

/// Modulo-10 sum of digits, counting each '-' as 1.
pub fn line_checksum(body: &str) -> u8 {
    let mut sum: u32 = 0;
    for byte in body.bytes() {
        if byte.is_ascii_digit() {
            sum += u32::from(byte - b'0');
        } else if byte == b'-' {
            sum += 1;
        }
    }
    (sum % 10) as u8
}

fn field<'a>(
    line: &'a str,
    range: std::ops::Range<usize>,
    name: &str,
) -> Result<&'a str, ScanError> {
    line.get(range.clone()).ok_or_else(|| {
        ScanError::invalid_input(format!(
            "TLE field '{name}' at columns {}..{} is out of range",
            range.start + 1,
            range.end
        ))
    })
}

fn parse_u32_field(
    line: &str,
    range: std::ops::Range<usize>,
    name: &str,
) -> Result<u32, ScanError> {
    let raw = field(line, range, name)?.trim();
    raw.parse::<u32>().map_err(|_| {
        ScanError::invalid_input(format!("TLE field '{name}' is not an integer: '{raw}'"))
    })
}

fn parse_f64_field(
    line: &str,
    range: std::ops::Range<usize>,
    name: &str,
) -> Result<f64, ScanError> {
    let raw = field(line, range, name)?.trim();
    let value = raw.parse::<f64>().map_err(|_| {
        ScanError::invalid_input(format!("TLE field '{name}' is not numeric: '{raw}'"))
    })?;
    if !value.is_finite() {
        return Err(ScanError::invalid_input(format!(
            "TLE field '{name}' must be finite; got {value}"
        )));
    }
    Ok(value)
}

/// Parses a field stored with an implied leading "0." (the eccentricity
/// column).
fn parse_implied_decimal_field(
    line: &str,
    range: std::ops::Range<usize>,
    name: &str,
) -> Result<f64, ScanError> {
    let raw = field(line, range, name)?.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ScanError::invalid_input(format!(
            "TLE field '{name}' must be decimal digits with an implied point: '{raw}'"
        )));
    }
    format!("0.{raw}").parse::<f64>().map_err(|_| {
        ScanError::invalid_input(format!("TLE field '{name}' is not numeric: '{raw}'"))
    })
}
