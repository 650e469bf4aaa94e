//! Human-readable byte sizes ("20MB", "512KB").

use thiserror::Error;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Suffixes from longest to shortest so "MB" wins over "B".
const SUFFIXES: [(&str, usize); 7] = [
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("G", GB),
    ("M", MB),
    ("K", KB),
    ("B", 1),
];

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '20MB', '512KB' or '1048576'")]
pub struct SizeParseError {
    input: String,
}

/// Parses a size into bytes.
///
/// Accepts a bare byte count or a number followed by `K`, `M`, `G` (with an
/// optional `B`), case-insensitive and with optional whitespace in between.
///
/// ```
/// use tilestack::config::parse_size;
///
/// assert_eq!(parse_size("20MB").unwrap(), 20 * 1024 * 1024);
/// assert_eq!(parse_size("512 kb").unwrap(), 512 * 1024);
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// ```
pub fn parse_size(s: &str) -> Result<usize, SizeParseError> {
    let error = || SizeParseError {
        input: s.to_string(),
    };
    let upper = s.trim().to_uppercase();

    let (number, multiplier) = SUFFIXES
        .iter()
        .find_map(|(suffix, multiplier)| {
            upper
                .strip_suffix(suffix)
                .map(|number| (number.trim_end(), *multiplier))
        })
        .unwrap_or((upper.as_str(), 1));

    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(error());
    }
    let number: usize = number.parse().map_err(|_| error())?;
    number.checked_mul(multiplier).ok_or_else(error)
}

/// Formats a byte count with the largest unit that divides it exactly.
///
/// ```
/// use tilestack::config::format_size;
///
/// assert_eq!(format_size(20_000 * 1024), "20000KB");
/// assert_eq!(format_size(2 * 1024 * 1024), "2MB");
/// assert_eq!(format_size(1000), "1000");
/// ```
pub fn format_size(bytes: usize) -> String {
    match bytes {
        0 => "0".to_string(),
        b if b % GB == 0 => format!("{}GB", b / GB),
        b if b % MB == 0 => format!("{}MB", b / MB),
        b if b % KB == 0 => format!("{}KB", b / KB),
        b => b.to_string(),
    }
}
