use bigdecimal::num_bigint::{BigInt, Sign};

/// Encode `value` as a CQL `varint`: minimal big-endian two's complement.
/// Zero is the single byte `0x00`.
pub fn encode_varint(value: &BigInt) -> Vec<u8> {
    value.to_signed_bytes_be()
}

/// Decode a CQL `varint`. The high bit of the first byte is the sign, an
/// empty slice is zero.
pub fn decode_varint(bytes: &[u8]) -> BigInt {
    if bytes.is_empty() {
        return BigInt::from(0);
    }
    BigInt::from_signed_bytes_be(bytes)
}

/// The length of [`encode_varint`]'s output without building it.
pub fn varint_len(value: &BigInt) -> usize {
    let magnitude_bits = match value.sign() {
        Sign::Minus => (-value - 1u8).bits(),
        _ => value.bits(),
    };
    (magnitude_bits / 8 + 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn check(value: BigInt, expected: &[u8]) {
        let encoded = encode_varint(&value);
        assert_eq!(encoded, expected, "encoding {}", value);
        assert_eq!(varint_len(&value), expected.len(), "length of {}", value);
        assert_eq!(decode_varint(&encoded), value);
    }

    #[test]
    fn edge_values() {
        check(BigInt::from(0), &[0x00]);
        check(BigInt::from(1), &[0x01]);
        check(BigInt::from(-1), &[0xff]);
        check(BigInt::from(127), &[0x7f]);
        check(BigInt::from(-127), &[0x81]);
        check(BigInt::from(128), &[0x00, 0x80]);
        check(BigInt::from(-128), &[0x80]);
        check(BigInt::from(-129), &[0xff, 0x7f]);
        check(
            BigInt::from(1_i128 << 63),
            &[0x00, 0x80, 0, 0, 0, 0, 0, 0, 0],
        );
        check(BigInt::from(i64::MIN), &[0x80, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn wide_values() {
        let big = BigInt::from(1) << 255;
        let encoded = encode_varint(&big);
        assert_eq!(encoded.len(), 33);
        assert_eq!(encoded[0], 0x00);
        assert_eq!(encoded[1], 0x80);
        assert_eq!(decode_varint(&encoded), big);

        let negative = -(BigInt::from(1) << 255usize);
        let encoded = encode_varint(&negative);
        assert_eq!(encoded.len(), 32);
        assert_eq!(decode_varint(&encoded), negative);
        assert_eq!(varint_len(&negative), 32);
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(decode_varint(&[]), BigInt::from(0));
    }

    #[test]
    fn redundant_sign_bytes_decode() {
        assert_eq!(decode_varint(&[0x00, 0x00, 0x01]), BigInt::from(1));
        assert_eq!(decode_varint(&[0xff, 0xff, 0xff]), BigInt::from(-1));
    }

    proptest! {
        #[test]
        fn round_trips_i128(value in any::<i128>()) {
            let value = BigInt::from(value);
            let encoded = encode_varint(&value);
            prop_assert_eq!(encoded.len(), varint_len(&value));
            prop_assert_eq!(decode_varint(&encoded), value);
        }

        #[test]
        fn decoded_bytes_reencode_minimally(bytes in proptest::collection::vec(any::<u8>(), 1..40)) {
            let value = decode_varint(&bytes);
            let encoded = encode_varint(&value);
            prop_assert!(encoded.len() <= bytes.len());
            prop_assert_eq!(&bytes[bytes.len() - encoded.len()..], &encoded[..]);
            prop_assert_eq!(decode_varint(&encoded), value);
        }
    }
}
