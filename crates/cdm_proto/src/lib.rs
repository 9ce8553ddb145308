//! cdm_proto — Envelope types and composition for CDM Channel
//!
//! A Confidential Data Message (CDM) is the atomic unit handed to the
//! untrusted relay: a signed envelope carrying either a chat message
//! (new thread, threaded reply, or membership-change broadcast) or a
//! structured encrypted-database operation.
//!
//! # Modules
//! - `envelope` — CDM wire types (what the relay sees)
//! - `thread`   — read-only view of an existing conversation
//! - `compose`  — the Envelope Composer: digest chaining + fan-out

pub mod compose;
pub mod envelope;
pub mod thread;

pub use compose::{ComposeError, Composer};
pub use envelope::{Cdm, ChatCdm, CreateCdm, DigestPair, InsertCdm, RecipientRole, RecipientSignature, Sender};
pub use thread::{Thread, ThreadCdm};
