//! Auxiliary 2-of-3 shares attached to `trigger_hedge`
//!
//! This is a fixed byte transform kept for wire parity with the program's
//! `mpc_shares` argument. Shares are trivially invertible and carry no
//! secrecy.

use crate::error::InstructionError;

/// Secret split into the shares sent with every hedge
pub const DEFAULT_SECRET: &[u8] = b"hedge_decision";

/// Minimum shares the program requires when any are supplied
pub const SHARE_THRESHOLD: usize = 2;

/// s1[i] = b+i, s2[i] = b+i+1 (mod 256), s3[i] = b ^ s1[i] ^ s2[i]
pub fn split_shares(secret: &[u8]) -> [Vec<u8>; 3] {
    let first: Vec<u8> = secret
        .iter()
        .enumerate()
        .map(|(i, &b)| b.wrapping_add(i as u8))
        .collect();
    let second: Vec<u8> = secret
        .iter()
        .enumerate()
        .map(|(i, &b)| b.wrapping_add(i as u8).wrapping_add(1))
        .collect();
    let third = secret
        .iter()
        .zip(first.iter().zip(&second))
        .map(|(&b, (&s1, &s2))| b ^ s1 ^ s2)
        .collect();

    [first, second, third]
}

/// XOR every share into a buffer as long as the longest share
pub fn reconstruct_shares(
    shares: &[Vec<u8>],
    threshold: usize,
) -> Result<Vec<u8>, InstructionError> {
    if shares.len() < threshold {
        return Err(InstructionError::TooFewShares {
            got: shares.len(),
            threshold,
        });
    }

    let len = shares.iter().map(Vec::len).max().unwrap_or(0);
    let mut secret = vec![0u8; len];
    for share in shares {
        for (out, byte) in secret.iter_mut().zip(share) {
            *out ^= byte;
        }
    }
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_bytes() {
        let [s1, s2, s3] = split_shares(b"ab");
        assert_eq!(s1, vec![b'a', b'b' + 1]);
        assert_eq!(s2, vec![b'a' + 1, b'b' + 2]);
        assert_eq!(s3[0], b'a' ^ b'a' ^ (b'a' + 1));
    }

    #[test]
    fn test_wraps_mod_256() {
        let [s1, s2, _] = split_shares(&[0xff, 0xff]);
        assert_eq!(s1, vec![0xff, 0x00]);
        assert_eq!(s2, vec![0x00, 0x01]);
    }

    #[test]
    fn test_reconstruct_recovers_secret() {
        let shares = split_shares(DEFAULT_SECRET).to_vec();
        assert_eq!(reconstruct_shares(&shares, SHARE_THRESHOLD).unwrap(), DEFAULT_SECRET);
    }

    #[test]
    fn test_reconstruct_needs_threshold() {
        let shares = vec![vec![1u8, 2, 3]];
        assert_eq!(
            reconstruct_shares(&shares, SHARE_THRESHOLD),
            Err(InstructionError::TooFewShares { got: 1, threshold: 2 })
        );
    }

    #[test]
    fn test_reconstruct_uneven_lengths() {
        let shares = vec![vec![0x0f], vec![0xf0, 0x01]];
        assert_eq!(reconstruct_shares(&shares, 2).unwrap(), vec![0xff, 0x01]);
    }
}
