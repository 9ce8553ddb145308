//! cdm_dispatch — Dispatch sequencing for CDM Channel
//!
//! Composed CDMs leave the process through exactly one serialized channel:
//! the Dispatch Sequencer. It guards the at-most-one-in-flight invariant,
//! serializes the CDM sequence into a transport payload, submits it to the
//! content-addressed store, and then asks the sponsor relay to forward the
//! resulting address — in that strict order, since the relay call embeds
//! the returned content address.
//!
//! # Modules
//! - `sequencer` — the `init → pending → success|error` state machine
//! - `transport` — content store and sponsor relay collaborator traits
//! - `config`    — per-session seed configuration

pub mod config;
pub mod sequencer;
pub mod transport;

pub use config::SessionConfig;
pub use sequencer::{DispatchError, DispatchReceipt, DispatchState, Dispatcher, Submission};
pub use transport::{ContentAddress, ContentStore, SponsorAck, SponsorRelay, TransportError};
