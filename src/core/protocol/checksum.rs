//! Checksum calculation for SW16 frames
//!
//! The board signs every status frame with a plain 8-bit sum of its payload.

/// Simple 8-bit sum (wrapping)
pub fn sum8_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Verify an 8-bit sum against the expected value
pub fn verify_sum8(data: &[u8], expected: u8) -> bool {
    sum8_checksum(data) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum8() {
        assert_eq!(sum8_checksum(&[]), 0x00);
        assert_eq!(sum8_checksum(&[0x01, 0x02, 0x03]), 0x06);
    }

    #[test]
    fn test_sum8_wraps() {
        assert_eq!(sum8_checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(sum8_checksum(&[0x80; 4]), 0x00);
    }

    #[test]
    fn test_verify_sum8() {
        assert!(verify_sum8(&[0x10, 0x20], 0x30));
        assert!(!verify_sum8(&[0x10, 0x20], 0x31));
    }
}
