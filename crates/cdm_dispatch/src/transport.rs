//! Transport collaborators.
//!
//! The actual HTTP wiring lives in the embedding application; the sequencer
//! only needs the two calls that gate its state transitions. Both are
//! opaque: the store returns a content address for the payload bytes, the
//! relay acknowledges a signed forward of that address.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Address assigned by the content store (e.g. an IPFS hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(pub String);

/// Relay acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorAck {
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Content store rejected payload: {0}")]
    Store(String),

    #[error("Sponsor relay rejected submission: {0}")]
    Relay(String),
}

/// Content-addressed payload store.
#[async_trait]
pub trait ContentStore {
    async fn submit_payload(&self, payload: &[u8]) -> Result<ContentAddress, TransportError>;
}

/// Sponsor relay: forwards a signed content address on the sender's behalf.
#[async_trait]
pub trait SponsorRelay {
    async fn sponsor(
        &self,
        signature: &str,
        address: &ContentAddress,
    ) -> Result<SponsorAck, TransportError>;
}
