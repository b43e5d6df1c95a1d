use crate::error::{Error, Result};

pub(crate) fn longest_common_prefix_length(key1: u64, key2: u64, no_bits: usize) -> usize {
    ((key1 ^ key2) << (64 - no_bits)).leading_zeros() as usize
}

/// Decode a fixed-width byte-string key as an unsigned big-endian integer.
pub(crate) fn decode_fixed(key: &[u8], width: usize) -> Result<u64> {
    if key.len() != width {
        return Err(Error::InvalidKeyLength {
            expected: width,
            actual: key.len(),
        });
    }
    Ok(key.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

pub(crate) fn encode_fixed(key: u64, width: usize) -> Vec<u8> {
    (0..width).rev().map(|i| (key >> (8 * i)) as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcp_length() {
        assert_eq!(longest_common_prefix_length(0b1010, 0b1011, 8), 7);
        assert_eq!(longest_common_prefix_length(0b1010, 0b0010, 8), 4);
        assert_eq!(longest_common_prefix_length(0xFF, 0x00, 8), 0);
        assert_eq!(longest_common_prefix_length(1, 0, 64), 63);
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let key = [0x12, 0x34, 0x56];
        let decoded = decode_fixed(&key, 3).unwrap();
        assert_eq!(decoded, 0x123456);
        assert_eq!(encode_fixed(decoded, 3), key.to_vec());
    }

    #[test]
    fn test_decode_wrong_length() {
        assert_eq!(
            decode_fixed(&[1, 2], 3),
            Err(Error::InvalidKeyLength {
                expected: 3,
                actual: 2
            })
        );
    }
}
