//! Bandwidth parsing utilities.
//!
//! Link bandwidths in topology files are written as a number followed by a
//! unit, e.g. "100mb" or "2.5kb", and are converted to bytes per second.

use regex::Regex;
use std::sync::LazyLock;

pub const BYTES_IN_KILOBYTE: f64 = 1024.0;
pub const BYTES_IN_MEGABYTE: f64 = BYTES_IN_KILOBYTE * 1024.0;

static BANDWIDTH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d*)(\S+)$").expect("Invalid bandwidth regex"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BandwidthError {
    #[error("Bandwidth spec doesn't match expected format: '{0}'")]
    Format(String),
    #[error("Unknown bandwidth units: {0}")]
    UnknownUnit(String),
}

/// Parse a bandwidth token (e.g. "100mb", "512kb") to bytes per second
///
/// Units are matched case-insensitively:
/// - Megabytes: "mb" (1024 * 1024 bytes)
/// - Kilobytes: "kb" (1024 bytes)
///
/// # Arguments
/// * `token` - The bandwidth token to parse
///
/// # Returns
/// * `Ok(f64)` - Bytes per second
/// * `Err(BandwidthError)` - If the number or the unit is not understood
///
/// # Examples
/// ```
/// use regionsim::topology::bandwidth::parse_bandwidth;
///
/// assert_eq!(parse_bandwidth("100mb"), Ok(100.0 * 1024.0 * 1024.0));
/// assert_eq!(parse_bandwidth("2KB"), Ok(2048.0));
/// assert!(parse_bandwidth("10gb").is_err());
/// ```
pub fn parse_bandwidth(token: &str) -> Result<f64, BandwidthError> {
    let captures = BANDWIDTH_PATTERN
        .captures(token)
        .ok_or_else(|| BandwidthError::Format(token.to_string()))?;

    let value: f64 = captures[1]
        .parse()
        .map_err(|_| BandwidthError::Format(token.to_string()))?;

    let unit = &captures[2];
    let multiplier = if unit.eq_ignore_ascii_case("mb") {
        BYTES_IN_MEGABYTE
    } else if unit.eq_ignore_ascii_case("kb") {
        BYTES_IN_KILOBYTE
    } else {
        return Err(BandwidthError::UnknownUnit(unit.to_string()));
    };

    Ok(value * multiplier)
}
