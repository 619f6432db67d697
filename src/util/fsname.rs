//! Filesystem-safe encoding of requirement tokens.
//!
//! Variant subdirectories are named after the requirement tokens that
//! produced them. Tokens may contain characters that are hostile to
//! filesystems or shells (`-`, `.`, `<`, `^`, ...), so they are encoded
//! with a small reversible scheme before being used as path components:
//!
//! * lowercase letters and digits pass through unchanged
//! * `_` encodes as `__`
//! * an uppercase letter encodes as `_` followed by its lowercase form
//! * any other byte encodes as `_` followed by two lowercase hex digits
//!
//! The scheme is deterministic and collision-free over the requirement
//! token alphabet, where every hex escape starts with a digit; decoding
//! therefore reads `_` + lowercase letter as an uppercase letter and
//! `_` + digit as a hex escape. Arbitrary unicode input encodes per
//! UTF-8 byte and may not survive a round trip.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated escape sequence at byte {position}")]
    Truncated { position: usize },
    #[error("invalid escape sequence `_{found}` at byte {position}")]
    InvalidEscape { found: char, position: usize },
    #[error("decoded bytes are not valid UTF-8")]
    NotUtf8,
}

/// Encode an arbitrary string as a filesystem-safe path component.
pub fn encode_filesystem_name(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' => out.push(byte as char),
            b'_' => out.push_str("__"),
            b'A'..=b'Z' => {
                out.push('_');
                out.push(byte.to_ascii_lowercase() as char);
            }
            other => {
                out.push('_');
                out.push_str(&format!("{:02x}", other));
            }
        }
    }
    out
}

/// Decode a path component produced by [`encode_filesystem_name`].
pub fn decode_filesystem_name(encoded: &str) -> Result<String, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'_' {
            out.push(byte);
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            None => return Err(DecodeError::Truncated { position: i }),
            Some(b'_') => {
                out.push(b'_');
                i += 2;
            }
            Some(next @ b'a'..=b'z') => {
                out.push(next.to_ascii_uppercase());
                i += 2;
            }
            Some(hi @ b'0'..=b'9') => match bytes.get(i + 2) {
                None => return Err(DecodeError::Truncated { position: i }),
                Some(lo) if matches!(lo, b'0'..=b'9' | b'a'..=b'f') => {
                    out.push((hex_digit(*hi) << 4) | hex_digit(*lo));
                    i += 3;
                }
                Some(lo) => {
                    return Err(DecodeError::InvalidEscape {
                        found: *lo as char,
                        position: i,
                    })
                }
            },
            Some(other) => {
                return Err(DecodeError::InvalidEscape {
                    found: *other as char,
                    position: i,
                })
            }
        }
    }
    String::from_utf8(out).map_err(|_| DecodeError::NotUtf8)
}

fn hex_digit(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        _ => byte - b'a' + 10,
    }
}
