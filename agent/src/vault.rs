//! At-rest sealing of model inputs using ChaCha20-Poly1305
//!
//! Token layout: nonce (12 bytes) || ciphertext (plaintext + 16 byte tag).
//! The plaintext is the decimal string form of the value.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;

use crate::error::{AgentError, Result};

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

pub struct InputVault {
    cipher: ChaCha20Poly1305,
}

impl InputVault {
    /// Fresh random key
    pub fn generate_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        key
    }

    pub fn from_key(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(AgentError::InvalidKey(key.len()));
        }
        let cipher = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| AgentError::InvalidKey(key.len()))?;
        Ok(Self { cipher })
    }

    pub fn from_hex(key: &str) -> Result<Self> {
        let bytes = hex::decode(key.trim_start_matches("0x"))
            .map_err(|_| AgentError::InvalidKey(key.len() / 2))?;
        Self::from_key(&bytes)
    }

    /// Vault with a throwaway key, for a single process lifetime
    pub fn ephemeral() -> Self {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&Self::generate_key()));
        Self { cipher }
    }

    pub fn seal(&self, value: f64) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), value.to_string().as_bytes())
            .map_err(|_| AgentError::InvalidToken)?;

        let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&ciphertext);
        Ok(token)
    }

    pub fn open(&self, token: &[u8]) -> Result<f64> {
        if token.len() < NONCE_LEN {
            return Err(AgentError::InvalidToken);
        }
        let (nonce, ciphertext) = token.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AgentError::InvalidToken)?;

        std::str::from_utf8(&plaintext)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(AgentError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let vault = InputVault::ephemeral();
        for value in [0.05, -0.25, 0.0, 123456789.987654321] {
            let token = vault.seal(value).unwrap();
            assert_eq!(vault.open(&token).unwrap(), value);
        }
    }

    #[test]
    fn test_same_value_different_tokens() {
        let vault = InputVault::ephemeral();
        assert_ne!(vault.seal(0.123).unwrap(), vault.seal(0.123).unwrap());
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(matches!(InputVault::from_key(b"short"), Err(AgentError::InvalidKey(5))));
        assert!(InputVault::from_key(&[7u8; 32]).is_ok());
        assert!(InputVault::from_hex(&hex::encode([7u8; 32])).is_ok());
    }

    #[test]
    fn test_tampered_or_foreign_token_rejected() {
        let vault = InputVault::from_key(&[1u8; 32]).unwrap();
        let mut token = vault.seal(0.42).unwrap();

        let other = InputVault::from_key(&[2u8; 32]).unwrap();
        assert!(matches!(other.open(&token), Err(AgentError::InvalidToken)));

        let last = token.len() - 1;
        token[last] ^= 0x80;
        assert!(matches!(vault.open(&token), Err(AgentError::InvalidToken)));
        assert!(matches!(vault.open(b"not_a_token"), Err(AgentError::InvalidToken)));
    }
}
