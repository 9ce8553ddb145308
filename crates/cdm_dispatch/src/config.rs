//! Per-session seed configuration.
//!
//! A session carries two identities: the sender seed signs relay
//! submissions (and is the seed chat envelopes are composed under), the
//! operator seed signs database envelopes emitted by the translator.
//! Seeds are configuration, not state — key storage is the embedding
//! application's problem.

use serde::{Deserialize, Serialize};

use crate::sequencer::Dispatcher;
use crate::transport::{ContentStore, SponsorRelay};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seed of the identity submitting to the relay.
    pub sender_seed: String,
    /// Seed of the root identity signing database envelopes.
    pub operator_seed: String,
}

impl SessionConfig {
    /// Build the session's dispatcher over the given transports.
    pub fn dispatcher<S: ContentStore, R: SponsorRelay>(&self, store: S, relay: R) -> Dispatcher<S, R> {
        Dispatcher::new(self.sender_seed.clone(), store, relay)
    }
}
