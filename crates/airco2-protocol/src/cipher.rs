//! Vendor frame obfuscation.
//!
//! Some AirCO2ntrol units scramble every 8-byte report with a fixed
//! substitution/rotation scheme. [`decrypt`] undoes it; [`encrypt`] is the
//! exact inverse and is used to simulate such units.
//!
//! # Algorithm
//!
//! ```text
//! input ──► unshuffle ──► xor KEY ──► rotate right 3 (carry from previous byte)
//!       ──► subtract nibble-swapped C-state ──► output
//! ```
//!
//! All arithmetic is wrapping `u8` arithmetic. The transform is total:
//! garbage in yields garbage out, and validity is judged afterwards by
//! [`crate::validation::validate_decrypted`].
//!
//! # Examples
//!
//! ```
//! use airco2_protocol::cipher::decrypt;
//!
//! let report = [0x30, 0xE4, 0x66, 0x20, 0x97, 0x46, 0xBF, 0x1A];
//! let frame = decrypt(&report);
//!
//! assert_eq!(&frame[..5], &[0x50, 0x03, 0xE8, 0x3B, 0x0D]);
//! ```

/// Number of bytes in an obfuscated report.
pub const BLOCK_LEN: usize = 8;

/// Vendor key. Also sent to the device as the handshake payload.
pub const KEY: [u8; BLOCK_LEN] = [0xC4, 0xC6, 0xC0, 0x92, 0x40, 0x23, 0xDC, 0x96];

/// Byte permutation: input byte `i` lands at position `SHUFFLE[i]`.
pub const SHUFFLE: [usize; BLOCK_LEN] = [2, 4, 0, 7, 1, 6, 5, 3];

/// Running-state constant, ASCII `Htemp99e`.
pub const CSTATE: [u8; BLOCK_LEN] = *b"Htemp99e";

/// [`CSTATE`] with each byte nibble-swapped.
const CSTATE_SWAPPED: [u8; BLOCK_LEN] = {
    let mut out = [0u8; BLOCK_LEN];
    let mut i = 0;
    while i < BLOCK_LEN {
        out[i] = CSTATE[i].rotate_left(4);
        i += 1;
    }
    out
};

/// Deobfuscate one 8-byte report.
#[must_use]
pub fn decrypt(input: &[u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
    let mut mixed = [0u8; BLOCK_LEN];
    for (i, &position) in SHUFFLE.iter().enumerate() {
        mixed[position] = input[i] ^ KEY[position];
    }

    let mut output = [0u8; BLOCK_LEN];
    for i in 0..BLOCK_LEN {
        let previous = mixed[(i + BLOCK_LEN - 1) % BLOCK_LEN];
        let rotated = (mixed[i] >> 3) | (previous << 5);
        output[i] = rotated.wrapping_sub(CSTATE_SWAPPED[i]);
    }

    output
}

/// Obfuscate one 8-byte frame the way the device does.
///
/// `decrypt(&encrypt(&frame)) == frame` for every frame.
#[must_use]
pub fn encrypt(frame: &[u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
    let mut rotated = [0u8; BLOCK_LEN];
    for i in 0..BLOCK_LEN {
        rotated[i] = frame[i].wrapping_add(CSTATE_SWAPPED[i]);
    }

    let mut mixed = [0u8; BLOCK_LEN];
    for i in 0..BLOCK_LEN {
        let next = rotated[(i + 1) % BLOCK_LEN];
        mixed[i] = (rotated[i] << 3) | (next >> 5);
    }

    let mut output = [0u8; BLOCK_LEN];
    for (i, &position) in SHUFFLE.iter().enumerate() {
        output[i] = mixed[position] ^ KEY[position];
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_cstate_nibble_swap() {
        // 'H' = 0x48 -> 0x84, 'e' = 0x65 -> 0x56
        assert_eq!(CSTATE_SWAPPED[0], 0x84);
        assert_eq!(CSTATE_SWAPPED[7], 0x56);
        assert_eq!(CSTATE_SWAPPED[5], 0x93);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut seen = [false; BLOCK_LEN];
        for &position in &SHUFFLE {
            assert!(!seen[position]);
            seen[position] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[rstest]
    #[case([0x30, 0xE4, 0x66, 0x20, 0x97, 0x46, 0xBF, 0x1A], [0x50, 0x03, 0xE8, 0x3B, 0x0D, 0x00, 0x00, 0x00])]
    #[case([0x92, 0xE4, 0xF6, 0x20, 0x0A, 0x46, 0xBF, 0x62], [0x42, 0x12, 0x34, 0x88, 0x0D, 0x00, 0x00, 0x00])]
    #[case([0x95, 0xE4, 0xEE, 0x20, 0x01, 0x46, 0xBF, 0x72], [0x41, 0x11, 0x94, 0xE6, 0x0D, 0x00, 0x00, 0x00])]
    #[case([0x31, 0xE4, 0x61, 0x20, 0x81, 0x46, 0xBF, 0xEA], [0x50, 0x61, 0xA8, 0x59, 0x0D, 0x00, 0x00, 0x00])]
    fn test_decrypt_known_reports(#[case] report: [u8; 8], #[case] expected: [u8; 8]) {
        assert_eq!(decrypt(&report), expected);
        assert_eq!(encrypt(&expected), report);
    }

    #[test]
    fn test_decrypt_all_zero_report() {
        assert_eq!(
            decrypt(&[0u8; 8]),
            [0x54, 0x51, 0x82, 0x3C, 0x41, 0x71, 0xE8, 0x3C]
        );
    }

    #[test]
    fn test_decrypt_is_deterministic() {
        let report = [0x92, 0xE4, 0xF6, 0x20, 0x0A, 0x46, 0xBF, 0x62];
        let first = decrypt(&report);
        for _ in 0..100 {
            assert_eq!(decrypt(&report), first);
        }
    }

    #[test]
    fn test_encrypt_inverts_decrypt_for_arbitrary_bytes() {
        let frame = [0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x23, 0x45, 0x67];
        assert_eq!(decrypt(&encrypt(&frame)), frame);
        assert_eq!(encrypt(&decrypt(&frame)), frame);
    }
}
