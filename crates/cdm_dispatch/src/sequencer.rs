//! The Dispatch Sequencer.
//!
//! A small state machine (`init → pending → success|error`) guarding
//! at-most-one in-flight submission per session. A `submit` observed while
//! `pending` is rejected — not queued, not dropped silently. Transport
//! failures are surfaced to the caller and never auto-retried; recovery is
//! re-compose and re-submit. Cancellation is not supported: once pending,
//! the operation runs to success or error.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use cdm_crypto::SeedKeyPair;
use cdm_proto::Cdm;

use crate::transport::{ContentAddress, ContentStore, SponsorRelay, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Init,
    Pending,
    Success,
    Error,
}

/// The transient composed-payload holder: a CDM sequence plus the query or
/// draft text it originated from. Consumed by a successful `submit` handoff.
#[derive(Debug, Clone)]
pub struct Submission {
    pub cdms: Vec<Cdm>,
    /// The originating query/draft text; must not be blank at submit time.
    pub source_text: String,
}

/// Returned when both transport calls succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReceipt {
    pub submission_id: String,
    pub content_address: ContentAddress,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("A submission is already in flight")]
    Busy,

    #[error("Nothing staged for submission")]
    NothingStaged,

    #[error("Query text is empty")]
    EmptyQuery,

    #[error("Transport failure during {stage}: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("Payload serialisation failed: {0}")]
    Serialisation(#[from] serde_json::Error),
}

struct Inner {
    state: DispatchState,
    staged: Option<Submission>,
}

/// Per-session sequencer. All emission flows through `submit`; the two
/// transport calls run strictly in order because the relay payload embeds
/// the content address the store returns.
pub struct Dispatcher<S, R> {
    store: S,
    relay: R,
    sender_seed: String,
    inner: Mutex<Inner>,
}

impl<S: ContentStore, R: SponsorRelay> Dispatcher<S, R> {
    pub fn new(sender_seed: impl Into<String>, store: S, relay: R) -> Self {
        Self {
            store,
            relay,
            sender_seed: sender_seed.into(),
            inner: Mutex::new(Inner {
                state: DispatchState::Init,
                staged: None,
            }),
        }
    }

    pub async fn state(&self) -> DispatchState {
        self.inner.lock().await.state
    }

    /// Stage a composed payload, replacing any previously staged one.
    pub async fn stage(&self, submission: Submission) {
        self.inner.lock().await.staged = Some(submission);
    }

    /// Submit the staged payload.
    ///
    /// Rejections (`Busy`, `NothingStaged`, `EmptyQuery`) leave the state —
    /// and, for the validation cases, the staged payload — untouched; the
    /// caller may stage and re-invoke later. Acceptance consumes the staged
    /// payload and transitions to `pending` before the first transport call.
    pub async fn submit(&self) -> Result<DispatchReceipt, DispatchError> {
        let (submission_id, payload) = {
            let mut inner = self.inner.lock().await;
            if inner.state == DispatchState::Pending {
                return Err(DispatchError::Busy);
            }
            let submission = match inner.staged.take() {
                None => return Err(DispatchError::NothingStaged),
                Some(submission) => submission,
            };
            if submission.source_text.trim().is_empty() {
                inner.staged = Some(submission);
                return Err(DispatchError::EmptyQuery);
            }
            let payload = match serde_json::to_vec(&submission.cdms) {
                Ok(payload) => payload,
                Err(err) => {
                    inner.staged = Some(submission);
                    return Err(err.into());
                }
            };
            inner.state = DispatchState::Pending;
            (uuid::Uuid::new_v4().to_string(), payload)
        };

        tracing::info!(
            target: "cdm_dispatch",
            event = "dispatch_begin",
            submission_id = %submission_id,
            payload_bytes = payload.len(),
        );

        let address = match self.store.submit_payload(&payload).await {
            Ok(address) => address,
            Err(err) => return self.fail(&submission_id, "content_store", err).await,
        };

        // The relay forwards the content address, so the signature covers
        // exactly those bytes.
        let keys = SeedKeyPair::from_seed(&self.sender_seed);
        let signature = URL_SAFE_NO_PAD.encode(keys.sign(address.0.as_bytes()));

        let ack = match self.relay.sponsor(&signature, &address).await {
            Ok(ack) => ack,
            Err(err) => return self.fail(&submission_id, "sponsor_relay", err).await,
        };

        self.inner.lock().await.state = DispatchState::Success;
        tracing::info!(
            target: "cdm_dispatch",
            event = "dispatch_ok",
            submission_id = %submission_id,
            content_address = %address.0,
        );

        Ok(DispatchReceipt {
            submission_id,
            content_address: address,
            completed_at: ack.received_at,
        })
    }

    async fn fail(
        &self,
        submission_id: &str,
        stage: &'static str,
        source: TransportError,
    ) -> Result<DispatchReceipt, DispatchError> {
        self.inner.lock().await.state = DispatchState::Error;
        tracing::error!(
            target: "cdm_dispatch",
            event = "dispatch_failed",
            submission_id = %submission_id,
            stage = %stage,
            error = %source,
        );
        Err(DispatchError::Transport { stage, source })
    }
}
