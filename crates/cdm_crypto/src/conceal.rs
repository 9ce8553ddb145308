//! Opaque concealment capability.
//!
//! Concealment turns a plaintext string into an opaque representation whose
//! digest can be published without revealing the plaintext. The transform
//! itself lives outside this workspace — implementations are provided by the
//! embedding application (spec: "randomize"). This crate only fixes the
//! contract:
//!
//! - concealing an empty string yields `None`, never an empty concealed
//!   value;
//! - the output is stable enough to hash (the composer digests it
//!   immediately) but fresh per call — concealing the same plaintext twice
//!   yields two different representations.

use serde::{Deserialize, Serialize};

/// Opaque concealed representation of a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcealedValue(String);

impl ConcealedValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Concealment capability provided by the embedding application.
pub trait Conceal {
    /// Conceal a plaintext string. Returns `None` iff the input is empty.
    fn conceal(&self, plaintext: &str) -> Option<ConcealedValue>;
}

impl<C: Conceal + ?Sized> Conceal for &C {
    fn conceal(&self, plaintext: &str) -> Option<ConcealedValue> {
        (**self).conceal(plaintext)
    }
}
