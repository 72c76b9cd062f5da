//! OSTA Compressed Unicode (dstring) codec.
//!
//! UDF 2.6.0 2.1.2: the first byte of a compressed-unicode field is a
//! compression id (8 = Latin-1, 16 = UTF-16BE); the remainder is the payload.

/// Decodes a full OSTA compressed-unicode field (compression id + payload).
/// An empty slice decodes to an empty string.
pub fn decode(bytes: &[u8]) -> String {
    let Some((&compression_id, payload)) = bytes.split_first() else {
        return String::new();
    };

    match compression_id {
        8 => payload.iter().map(|&b| b as char).collect(),
        16 => payload
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .map(|unit| char::from_u32(unit as u32).unwrap_or('\u{FFFD}'))
            .collect(),
        other => {
            log::warn!("unknown OSTA compression id {other}, treating identifier as empty");
            String::new()
        }
    }
}

/// Encodes a string with 8-bit (Latin-1) compression when every character
/// fits in a byte, otherwise falls back to UTF-16BE.
pub fn encode(s: &str) -> Vec<u8> {
    let needs_16bit = s.chars().any(|c| c as u32 > 0xFF);
    let mut out = Vec::with_capacity(1 + s.len() * if needs_16bit { 2 } else { 1 });
    if needs_16bit {
        out.push(16);
        for c in s.chars() {
            out.extend_from_slice(&(c as u16).to_be_bytes());
        }
    } else {
        out.push(8);
        for c in s.chars() {
            out.push(c as u8);
        }
    }
    out
}
