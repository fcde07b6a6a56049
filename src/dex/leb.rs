#[cfg(test)]
pub(crate) fn encode_uleb128(value: u32) -> Vec<u8> {
    let mut result = Vec::new();
    let mut remaining = value;

    if remaining == 0 {
        result.push(0);
        return result;
    }

    while remaining != 0 {
        let mut byte = (remaining & 0x7F) as u8;
        remaining >>= 7;

        if remaining != 0 {
            byte |= 0x80;
        }

        result.push(byte);
    }

    result
}

/// Decode one uleb128 value, returning it with the number of bytes consumed.
/// `None` if the input ends while the continuation bit is still set, or if
/// the value does not fit in 32 bits.
pub(crate) fn decode_uleb128(encoded: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;
    let mut count: usize = 0;

    for &byte in encoded {
        count += 1;

        value |= ((byte & 0x7F) as u32) << shift;

        // DEX uleb128 values are 32-bit: the 5th byte holds the top 4 bits and ends the value.
        if count == 5 {
            return if byte & 0xF0 == 0 { Some((value, count)) } else { None };
        }

        if (byte & 0x80) == 0 {
            return Some((value, count));
        }
        shift += 7;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uleb128() {
        let cases = vec![
            (0, vec![0x00]),
            (1, vec![0x01]),
            (127, vec![0x7F]),
            (128, vec![0x80, 0x01]),
            (16256, vec![0x80, 0x7F]),
            (624485, vec![0xE5, 0x8E, 0x26]),
        ];

        for (value, expected) in cases {
            assert_eq!(encode_uleb128(value), expected);
        }
    }

    #[test]
    fn test_decode_uleb128() {
        let cases = vec![
            (vec![0x00], 0, 1),
            (vec![0x01], 1, 1),
            (vec![0x7F], 127, 1),
            (vec![0x80, 0x01], 128, 2),
            (vec![0x80, 0x7F], 16256, 2),
            (vec![0xE5, 0x8E, 0x26], 624485, 3),
            (vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F], u32::MAX, 5),
        ];

        for (encoded, expected, size) in cases {
            assert_eq!(decode_uleb128(&encoded), Some((expected, size)));
        }
    }

    #[test]
    fn test_decode_uleb128_stops_at_terminator() {
        assert_eq!(decode_uleb128(&[0x05, 0x80, 0x80]), Some((5, 1)));
    }

    #[test]
    fn test_decode_uleb128_truncated() {
        assert_eq!(decode_uleb128(&[]), None);
        assert_eq!(decode_uleb128(&[0x80]), None);
        assert_eq!(decode_uleb128(&[0xE5, 0x8E]), None);
        // still continuing at the 5th byte
        assert_eq!(decode_uleb128(&[0x80; 5]), None);
        assert_eq!(decode_uleb128(&[0x80; 6]), None);
    }

    #[test]
    fn test_decode_uleb128_too_wide() {
        // 584 + 2^32 would silently read back as 584
        assert_eq!(decode_uleb128(&[0xC8, 0x84, 0x80, 0x80, 0x10]), None);
        assert_eq!(decode_uleb128(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]), None);
    }
}
