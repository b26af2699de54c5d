//! Modified UTF-8, the string encoding of `CONSTANT_Utf8` entries.
//!
//! Differs from standard UTF-8 in two ways: NUL is written as `C0 80`, and
//! supplementary characters are written as two three-byte surrogates.

/// Decode modified UTF-8. Returns `None` on malformed input or unpaired surrogates.
pub fn decode(bytes: &[u8]) -> Option<String> {
    if bytes.iter().all(|b| (0x01..0x80).contains(b)) {
        return std::str::from_utf8(bytes).ok().map(str::to_string);
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 {
            0x01..=0x7F => {
                units.push(b0 as u16);
                i += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes, i + 1)?;
                units.push((((b0 & 0x1F) as u16) << 6) | b1);
                i += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, i + 1)?;
                let b2 = continuation(bytes, i + 2)?;
                units.push((((b0 & 0x0F) as u16) << 12) | (b1 << 6) | b2);
                i += 3;
            }
            _ => return None,
        }
    }
    String::from_utf16(&units).ok()
}

fn continuation(bytes: &[u8], at: usize) -> Option<u16> {
    let b = *bytes.get(at)?;
    (b & 0xC0 == 0x80).then_some((b & 0x3F) as u16)
}

/// Encode a string as modified UTF-8.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_unchanged() {
        assert_eq!(encode("prepareStatement"), b"prepareStatement".to_vec());
        assert_eq!(decode(b"java/sql/SQLException").as_deref(), Some("java/sql/SQLException"));
    }

    #[test]
    fn test_nul_uses_two_bytes() {
        assert_eq!(encode("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode(&[b'a', 0xC0, 0x80, b'b']).as_deref(), Some("a\0b"));
    }

    #[test]
    fn test_supplementary_characters_use_surrogates() {
        let text = "x\u{1F600}";
        let encoded = encode(text);
        assert_eq!(encoded.len(), 1 + 6, "two 3-byte surrogates");
        assert_eq!(decode(&encoded).as_deref(), Some(text));
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(decode(&[0xC3]), None, "truncated sequence");
        assert_eq!(decode(&[0xF0, 0x9F, 0x98, 0x80]), None, "4-byte form is not allowed");
        assert_eq!(decode(&[0xED, 0xA0, 0xBD]), None, "lone high surrogate");
    }
}
