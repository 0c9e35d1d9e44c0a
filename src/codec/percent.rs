//! URI-component percent-encoding.

use crate::error::{Result, StateError};

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Characters `encodeURIComponent` leaves untouched.
fn is_component_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')'
        )
}

/// Characters that may appear verbatim in a path, query or fragment.
fn is_url_code_point(byte: u8) -> bool {
    byte.is_ascii_graphic() && !matches!(byte, b'"' | b'<' | b'>' | b'`')
}

fn push_escaped(out: &mut String, byte: u8) {
    out.push('%');
    out.push(HEX_UPPER[(byte >> 4) as usize] as char);
    out.push(HEX_UPPER[(byte & 0x0f) as usize] as char);
}

/// Percent-encode with `encodeURIComponent` semantics.
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &byte in input.as_bytes() {
        if is_component_unreserved(byte) {
            out.push(byte as char);
        } else {
            push_escaped(&mut out, byte);
        }
    }
    out
}

/// Escape bytes that cannot appear verbatim in a URL. Existing `%XX`
/// sequences pass through unchanged.
pub(crate) fn encode_url_part(input: &str) -> String {
    encode_url_part_reserving(input, &[])
}

/// Like [`encode_url_part`], also escaping the `reserved` delimiters. Used
/// by field setters, where a `?` or `#` would start the next component.
pub(crate) fn encode_url_part_reserving(input: &str, reserved: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    for &byte in input.as_bytes() {
        if is_url_code_point(byte) && !reserved.contains(&byte) {
            out.push(byte as char);
        } else {
            push_escaped(&mut out, byte);
        }
    }
    out
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Percent-decode with `decodeURIComponent` semantics.
///
/// `+` is not a space. A truncated or non-hex escape, or a byte sequence
/// that is not UTF-8, is an error.
pub fn decode_component(input: &str) -> Result<String> {
    if !input.contains('%') {
        return Ok(input.to_string());
    }

    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3).and_then(|pair| {
                Some((hex_value(pair[0])? << 4) | hex_value(pair[1])?)
            });
            match escape {
                Some(byte) => out.push(byte),
                None => {
                    return Err(StateError::Decode(format!(
                        "invalid escape at offset {} in {:?}",
                        i, input
                    )))
                }
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out)
        .map_err(|_| StateError::Decode(format!("escapes in {:?} are not UTF-8", input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("abc-_.!~*'()"), "abc-_.!~*'()");
        assert_eq!(encode_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_component("/?#+%"), "%2F%3F%23%2B%25");
        assert_eq!(encode_component("é"), "%C3%A9");
    }

    #[test]
    fn test_encode_url_part_reserving() {
        assert_eq!(encode_url_part("a?b#c d%20"), "a?b#c%20d%20");
        assert_eq!(encode_url_part_reserving("a?b#c", b"?#"), "a%3Fb%23c");
        assert_eq!(encode_url_part_reserving("q=1#x", b"#"), "q=1%23x");
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("a%20b").unwrap(), "a b");
        assert_eq!(decode_component("a+b").unwrap(), "a+b");
        assert_eq!(decode_component("%c3%a9").unwrap(), "é");
        assert_eq!(decode_component("plain").unwrap(), "plain");
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode_component("%"), Err(StateError::Decode(_))));
        assert!(matches!(decode_component("%4"), Err(StateError::Decode(_))));
        assert!(matches!(decode_component("%G1"), Err(StateError::Decode(_))));
        assert!(matches!(decode_component("%FF"), Err(StateError::Decode(_))));
    }

    #[test]
    fn test_encode_url_part_preserves_escapes() {
        assert_eq!(encode_url_part("a b/%20c"), "a%20b/%20c");
        assert_eq!(encode_url_part("<x>"), "%3Cx%3E");
        assert_eq!(encode_url_part("naïve"), "na%C3%AFve");
    }
}
