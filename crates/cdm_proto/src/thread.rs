//! Read-only view of an existing conversation.
//!
//! Threads are owned by a collaborator (the embedding application's index);
//! the composer only ever reads the root CDM and the member list, plus the
//! stored history when fanning out a membership change.

use serde::{Deserialize, Serialize};

use cdm_crypto::conceal::ConcealedValue;

/// One stored CDM as the thread index returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadCdm {
    /// Index-assigned identifier, used only to recognise the root.
    pub id: String,
    pub subject: String,
    pub message: String,
    /// Stored concealed halves; `None` on derived copies and empty halves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concealed_subject: Option<ConcealedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concealed_message: Option<ConcealedValue>,
    /// Stored leaf digests, as published when the CDM was first composed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_digest: Option<String>,
}

/// Ordered history plus the current member list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    /// Prior CDMs, oldest first; index 0 is the thread root.
    pub cdms: Vec<ThreadCdm>,
    /// Current member identities.
    pub members: Vec<String>,
}

impl Thread {
    /// The thread root, if any history exists.
    pub fn root(&self) -> Option<&ThreadCdm> {
        self.cdms.first()
    }
}
