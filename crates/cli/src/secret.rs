//! Obscuring of stored passwords
//!
//! Stored secrets are sealed with ChaCha20-Poly1305 under a key every
//! installation shares. This keeps passwords out of plain sight in
//! `config.toml`; it is not protection against anyone who can read this
//! source.
//!
//! Format: `hex(nonce || ciphertext)`. The nonce is derived from the
//! plaintext, so sealing the same secret twice gives the same string.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use sha2::{Digest, Sha256};
use thiserror::Error;

const KEY_CONTEXT: &[u8] = b"sutr/credentials/v1";
const NONCE_LEN: usize = 12;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SecretError {
    #[error("stored secret is not valid hex")]
    Encoding,

    #[error("stored secret is too short")]
    Truncated,

    #[error("stored secret cannot be decrypted; run `sutr configure` again")]
    Corrupted,
}

fn cipher() -> ChaCha20Poly1305 {
    let key = Sha256::digest(KEY_CONTEXT);
    ChaCha20Poly1305::new(Key::from_slice(&key))
}

fn nonce_for(plaintext: &str) -> [u8; NONCE_LEN] {
    let digest = Sha256::new()
        .chain_update(KEY_CONTEXT)
        .chain_update(b"/nonce/")
        .chain_update(plaintext.as_bytes())
        .finalize();
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&digest[..NONCE_LEN]);
    nonce
}

/// Seal a secret for storage
pub fn obscure(plaintext: &str) -> Result<String, SecretError> {
    let nonce = nonce_for(plaintext);
    let sealed = cipher()
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| SecretError::Corrupted)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(hex::encode(out))
}

/// Recover a secret sealed by [`obscure`]
pub fn reveal(stored: &str) -> Result<String, SecretError> {
    let bytes = hex::decode(stored.trim()).map_err(|_| SecretError::Encoding)?;
    if bytes.len() <= NONCE_LEN {
        return Err(SecretError::Truncated);
    }
    let (nonce, sealed) = bytes.split_at(NONCE_LEN);
    let plain = cipher()
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| SecretError::Corrupted)?;
    String::from_utf8(plain).map_err(|_| SecretError::Corrupted)
}
