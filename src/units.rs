//! Size units and key normalisation.
//!
//! All scaling in the crate is binary (1024-based). Elasticsearch reports `gb` meaning
//! GiB, and the cost figures are computed against that same unit.

use thiserror::Error;
use tracing::warn;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;
pub const TIB: u64 = 1024 * GIB;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizeParseError {
    #[error("empty size string")]
    Empty,
    #[error("unknown size unit in {0:?}")]
    UnknownUnit(String),
    #[error("invalid numeric prefix in {0:?}")]
    InvalidNumber(String),
}

pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}

pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / MIB as f64
}

/// Internal and system indices start with a dot and are left out of every report.
pub fn is_system_index(name: &str) -> bool {
    name.starts_with('.')
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    match unit {
        "b" => Some(1),
        "k" | "kb" => Some(KIB),
        "m" | "mb" => Some(MIB),
        "g" | "gb" => Some(GIB),
        "t" | "tb" => Some(TIB),
        _ => None,
    }
}

fn split_unit(text: &str, suffix_len: usize) -> Option<(&str, u64)> {
    let cut = text.len().checked_sub(suffix_len)?;
    if !text.is_char_boundary(cut) {
        return None;
    }
    let (number, unit) = text.split_at(cut);
    unit_multiplier(unit).map(|m| (number, m))
}

/// Parses a human readable size such as `12.3gb`, `512k` or `100b` into bytes.
pub fn try_parse_size(text: &str) -> Result<u64, SizeParseError> {
    let lowered = text.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return Err(SizeParseError::Empty);
    }

    // Two-letter suffixes first so that "12kb" is not read as "12k" + "b".
    let (number, multiplier) = split_unit(&lowered, 2)
        .or_else(|| split_unit(&lowered, 1))
        .ok_or_else(|| SizeParseError::UnknownUnit(text.to_string()))?;

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| SizeParseError::InvalidNumber(text.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(SizeParseError::InvalidNumber(text.to_string()));
    }

    let bytes = value * multiplier as f64;
    if bytes >= u64::MAX as f64 {
        return Err(SizeParseError::InvalidNumber(text.to_string()));
    }
    Ok(bytes as u64)
}

/// Like [`try_parse_size`], but an unparseable size is logged and counted as zero so a
/// single bad value never aborts an aggregation.
pub fn parse_size(text: &str) -> u64 {
    match try_parse_size(text) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(input = text, error = %e, "Unparseable size, counting it as zero");
            0
        }
    }
}

/// Formats a byte count with two decimals in the largest unit below 1024 (up to TB).
pub fn format_size(bytes: f64) -> String {
    let mut value = bytes;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} TB", value)
}
