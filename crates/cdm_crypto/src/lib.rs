//! cdm_crypto — CDM Channel cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - Seed-derived keypairs are deterministic: the same seed phrase always
//!   yields the same Ed25519 keypair, so a seed is the whole identity.
//!
//! # Module layout
//! - `keys`    — deterministic seed keypairs + fresh random seeds
//! - `digest`  — SHA-256 leaf/pair digest scheme for envelope chaining
//! - `conceal` — opaque concealment capability (external collaborator)
//! - `error`   — unified error type

pub mod conceal;
pub mod digest;
pub mod error;
pub mod keys;

pub use conceal::{Conceal, ConcealedValue};
pub use error::CryptoError;
pub use keys::{fresh_random_seed, PublicKeyBytes, SeedKeyPair};
