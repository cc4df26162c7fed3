//! Helpers that produce mojibake, for checking that decoding undoes it.

use crate::table;

/// Encodes `original` with a legacy encoding, then reads every byte back as a
/// code page 437 character.
pub fn mangle(original: &str, legacy: &'static encoding_rs::Encoding) -> String {
    let (bytes, _, had_errors) = legacy.encode(original);
    assert!(!had_errors, "{:?} is not representable in {}", original, legacy.name());
    cp437_view(&bytes)
}

/// Reads raw bytes as code page 437 characters.
pub fn cp437_view(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| table::cp437().char_for(b).unwrap_or(b as char))
        .collect()
}
