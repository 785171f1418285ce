//! Identifier obfuscation: coordinate substitution over a 36-symbol alphabet.
//!
//! Each character of `A-Z0-9` maps to its (row, column) position in a 6x6
//! grid; each coordinate digit then maps through a fixed substitution table.
//! The code is reversible and keyless. It exists so identifiers are not
//! stored in plain form; it is NOT a confidentiality boundary.

use crate::error::CipherError;

/// The alphabet, laid out row-major in a 6x6 grid.
const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const COLUMNS: usize = 6;

/// Coordinate digit -> output symbol. Rows and columns only reach 5, but the
/// full digit table is part of the published code and is kept intact.
const SUBSTITUTION: [char; 10] = ['$', '#', '%', 'A', 'B', 'C', 'D', 'E', 'F', 'G'];

fn substitute(digit: usize) -> char {
    SUBSTITUTION[digit]
}

fn invert(symbol: char) -> Option<u8> {
    SUBSTITUTION
        .iter()
        .position(|&s| s == symbol)
        .map(|d| d as u8)
}

/// Obfuscate `text` into a coordinate-substitution token.
///
/// Input is uppercased first; characters outside `A-Z0-9` are silently
/// dropped, never an error.
pub fn obfuscate(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for ch in text.to_uppercase().chars() {
        if let Some(idx) = ALPHABET.find(ch) {
            out.push(substitute(idx / COLUMNS));
            out.push(substitute(idx % COLUMNS));
        }
    }
    out
}

/// Reverse [`obfuscate`], reconstructing the uppercased alphanumeric text.
///
/// Unlike obfuscation, revealing is strict: unknown symbols, an odd symbol
/// count, or coordinates outside the grid are malformed tokens.
pub fn reveal(token: &str) -> Result<String, CipherError> {
    let mut digits = Vec::with_capacity(token.len());
    for symbol in token.chars() {
        let digit = invert(symbol).ok_or(CipherError::InvalidSymbol { symbol })?;
        digits.push(digit);
    }

    if digits.len() % 2 != 0 {
        return Err(CipherError::OddLength { len: digits.len() });
    }

    let mut out = String::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        let (row, col) = (pair[0], pair[1]);
        let idx = row as usize * COLUMNS + col as usize;
        let ch = ALPHABET
            .as_bytes()
            .get(idx)
            .copied()
            .ok_or(CipherError::OutOfRange { row, col })?;
        out.push(ch as char);
    }
    Ok(out)
}
