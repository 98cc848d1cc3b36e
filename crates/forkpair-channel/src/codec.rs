use bytes::{Buf, BufMut, BytesMut};

/// Width of one value on the wire (a native `i32`).
pub const VALUE_WIDTH: usize = std::mem::size_of::<i32>();

/// Encode one value into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬─────
/// │ value 0      │ value 1      │ ...   (EOF terminates)
/// │ (4B native)  │ (4B native)  │
/// └──────────────┴──────────────┴─────
/// ```
pub fn encode_value(value: i32, dst: &mut BytesMut) {
    dst.reserve(VALUE_WIDTH);
    dst.put_i32_ne(value);
}

/// Decode one value from a buffer.
///
/// Returns `None` if the buffer doesn't hold a complete value yet.
/// On success, consumes the value bytes from the buffer.
pub fn decode_value(src: &mut BytesMut) -> Option<i32> {
    if src.len() < VALUE_WIDTH {
        return None;
    }
    Some(src.get_i32_ne())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_native_byte_order() {
        let mut buf = BytesMut::new();
        encode_value(0x0102_0304, &mut buf);
        assert_eq!(buf.as_ref(), 0x0102_0304i32.to_ne_bytes());
    }

    #[test]
    fn decode_incomplete_value() {
        let mut buf = BytesMut::from(&[0x01, 0x00, 0x00][..]);
        assert!(decode_value(&mut buf).is_none());
        assert_eq!(buf.len(), 3, "incomplete bytes must stay buffered");
    }

    #[test]
    fn decode_consumes_one_value_at_a_time() {
        let mut buf = BytesMut::new();
        encode_value(7, &mut buf);
        encode_value(-3, &mut buf);
        buf.put_u8(0xAA);

        assert_eq!(decode_value(&mut buf), Some(7));
        assert_eq!(decode_value(&mut buf), Some(-3));
        assert_eq!(decode_value(&mut buf), None);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn value_width_matches_i32() {
        assert_eq!(VALUE_WIDTH, 4);
    }
}
