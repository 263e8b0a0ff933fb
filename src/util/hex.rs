//! # Hex Utilities
//!
//! Formatting and lenient parsing of hex strings for logs, the CLI and register
//! dumps. Strict encoding and decoding is left to the `hex` crate.

use thiserror::Error;

/// Errors from lenient hex parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("Odd number of hex digits: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,
}

/// Format data as "40 01 00 00" with spaces between bytes
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a hex string that may contain spaces, colons or a `0x` prefix
pub fn parse_hex_lenient(input: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = body.chars().filter(|c| c.is_ascii_hexdigit()).collect();

    if digits.is_empty() {
        return Err(HexError::EmptyString);
    }
    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength(digits.len()));
    }

    // Only hex digits remain, so decoding cannot fail
    Ok(hex::decode(&digits).unwrap_or_default())
}

/// Register dump as 16 registers per line, each prefixed by its first address
pub fn format_register_dump(registers: &[u8]) -> String {
    registers
        .chunks(16)
        .enumerate()
        .map(|(line, chunk)| format!("0x{:02X}: {}", line * 16, format_hex_compact(chunk)))
        .collect::<Vec<_>>()
        .join("\n")
}
