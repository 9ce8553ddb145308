//! Seed-derived signing keys.
//!
//! Every participant is identified by a seed phrase. The Ed25519 keypair is
//! derived deterministically from the seed, so key storage reduces to seed
//! storage: `from_seed` on the same seed always yields the same keypair,
//! which lets a sender re-sign envelopes without any persisted key material.
//!
//! Column concealment keys are the one exception — they are freshly random
//! per column (`fresh_random_seed`) and travel inside the table-definition
//! envelope itself.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier as _, VerifyingKey};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

/// Domain separation context for seed → signing key derivation.
const SEED_KEY_CONTEXT: &str = "cdm-channel seed keypair v1";

// ── Newtype wrappers ──────────────────────────────────────────────────────────

/// 32-byte Ed25519 public key, base64url-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKeyBytes(pub Vec<u8>);

impl PublicKeyBytes {
    pub fn to_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    pub fn from_b64(s: &str) -> Result<Self, CryptoError> {
        let bytes = URL_SAFE_NO_PAD.decode(s)?;
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(format!(
                "Public key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Human-readable fingerprint: BLAKE3 of the public key, truncated to
    /// 20 bytes, hex-encoded in groups of 4 for display.
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(&self.0);
        let hex = hex::encode(&hash.as_bytes()[..20]);
        hex.chars()
            .collect::<Vec<_>>()
            .chunks(4)
            .map(|c| c.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ── Seed keypair ──────────────────────────────────────────────────────────────

/// Deterministic signing keypair derived from a seed phrase.
/// Drop clears the secret half via ZeroizeOnDrop.
#[derive(ZeroizeOnDrop)]
pub struct SeedKeyPair {
    #[zeroize(skip)]
    pub public: PublicKeyBytes,
    secret_bytes: [u8; 32],
}

impl SeedKeyPair {
    /// Derive the keypair for a seed phrase. Same seed, same keypair.
    pub fn from_seed(seed: &str) -> Self {
        let secret_bytes = blake3::derive_key(SEED_KEY_CONTEXT, seed.as_bytes());
        let signing_key = SigningKey::from_bytes(&secret_bytes);
        let public = PublicKeyBytes(signing_key.verifying_key().to_bytes().to_vec());
        Self { public, secret_bytes }
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.secret_bytes)
    }

    /// Sign arbitrary bytes; returns 64-byte raw Ed25519 signature.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.signing_key().sign(msg).to_bytes().to_vec()
    }

    /// Verify a signature made by any Ed25519 public key.
    pub fn verify(public_bytes: &[u8], msg: &[u8], sig_bytes: &[u8]) -> Result<(), CryptoError> {
        let vk = VerifyingKey::from_bytes(
            public_bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKey("Bad pubkey len".into()))?,
        )
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let sig = Signature::from_bytes(
            sig_bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKey("Bad sig len".into()))?,
        );
        vk.verify(msg, &sig)
            .map_err(|_| CryptoError::SignatureVerification)
    }

    /// Export the public key in base64 format for envelope headers.
    pub fn public_b64(&self) -> String {
        self.public.to_b64()
    }
}

// ── Random seeds ──────────────────────────────────────────────────────────────

/// Generate a fresh cryptographically random seed (base64url, 256 bits).
/// Used only for new column concealment keys.
pub fn fresh_random_seed() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_keypair_is_deterministic() {
        let a = SeedKeyPair::from_seed("manage manage manage");
        let b = SeedKeyPair::from_seed("manage manage manage");
        assert_eq!(a.public, b.public);

        let sig_a = a.sign(b"payload");
        let sig_b = b.sign(b"payload");
        assert_eq!(sig_a, sig_b);
    }

    #[test]
    fn different_seeds_different_keys() {
        let a = SeedKeyPair::from_seed("alpha");
        let b = SeedKeyPair::from_seed("bravo");
        assert_ne!(a.public, b.public);
    }

    #[test]
    fn sign_verify_roundtrip() {
        let kp = SeedKeyPair::from_seed("verify me");
        let sig = kp.sign(b"digest bytes");
        assert!(SeedKeyPair::verify(&kp.public.0, b"digest bytes", &sig).is_ok());
        assert!(SeedKeyPair::verify(&kp.public.0, b"other bytes", &sig).is_err());
    }

    #[test]
    fn fresh_seeds_are_distinct() {
        assert_ne!(fresh_random_seed(), fresh_random_seed());
    }

    #[test]
    fn public_key_b64_roundtrip() {
        let kp = SeedKeyPair::from_seed("roundtrip");
        let b64 = kp.public_b64();
        let decoded = PublicKeyBytes::from_b64(&b64).unwrap();
        assert_eq!(decoded, kp.public);
    }
}
