//! CDM wire types — what the relay and content store see.
//!
//! The relay is a DUMB SPONSOR: it forwards opaque payload bytes to the
//! content-addressed store and never interprets them. What it can see:
//!   - cleartext convenience copies (subject/message), which the embedding
//!     application keeps empty for anything sensitive
//!   - concealed representations (opaque, only on originating copies)
//!   - digest references linking replies and forwards
//!   - recipient identities and one shared signature per envelope
//!
//! Signature trade-off: all recipients of one CDM share the same signature
//! bytes, computed over the envelope's digest — there is no per-recipient
//! binding. Verifiers check the sender, not the fan-out.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use cdm_crypto::{digest, CryptoError, SeedKeyPair};
use cdm_crypto::conceal::ConcealedValue;

/// The atomic unit submitted to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cdm {
    /// Direct or threaded chat message.
    Chat(ChatCdm),
    /// Encrypted-table schema definition.
    Create(CreateCdm),
    /// Encrypted row insertion.
    Insert(InsertCdm),
}

// ── Chat envelopes ────────────────────────────────────────────────────────────

/// A pair of leaf digests referencing another CDM's subject/message halves.
/// Either half is absent when the corresponding source was empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestPair {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
    /// Primary recipient.
    To,
    /// Carbon copy — used for thread broadcast.
    Cc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientSignature {
    /// Recipient identity (base64url Ed25519 public key or address).
    pub recipient: String,
    pub role: RecipientRole,
    /// Base64url Ed25519 signature over the envelope's signing digest.
    /// Identical bytes for every recipient of one CDM.
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    /// Base64url Ed25519 public key of the composer.
    pub sender_public_key: String,
}

/// Chat envelope.
///
/// Exactly one of two postures holds per instance: an *originating* copy
/// carries its concealed halves (and whatever `regarding` reference its
/// thread position requires), while a *derived* copy carries `forwarded`
/// and no live concealment secret. The re-concealed root copy of a
/// membership broadcast is the boundary case — it carries a FRESH
/// concealment, never the original one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCdm {
    /// Trimmed cleartext convenience copy; may be empty.
    pub subject: String,
    /// Trimmed cleartext convenience copy; may be empty.
    pub message: String,

    /// Concealed subject — only on the originating copy, `None` iff the
    /// subject was empty or this is a derived copy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concealed_subject: Option<ConcealedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concealed_message: Option<ConcealedValue>,

    /// Digest reference to the message being replied to, or to the message
    /// whose concealed content was just forwarded in-line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regarding: Option<DigestPair>,

    /// Digest reference to the original CDM this record re-presents, when
    /// acting as a historical copy in a membership-change broadcast.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarded: Option<DigestPair>,

    /// Ordered fan-out; all entries share one signature.
    pub recipients: Vec<RecipientSignature>,

    pub from: Sender,
}

impl ChatCdm {
    /// Recompute the signing digest from the carried concealed halves.
    ///
    /// Only originating copies can be re-digested: a derived copy whose
    /// cleartext half is non-empty but whose concealment was withheld has
    /// no digestable material, and says so.
    pub fn signing_digest(&self) -> Result<[u8; 32], CryptoError> {
        if !self.subject.is_empty() && self.concealed_subject.is_none() {
            return Err(CryptoError::DigestUnavailable(
                "derived copy does not carry its concealed subject".into(),
            ));
        }
        if !self.message.is_empty() && self.concealed_message.is_none() {
            return Err(CryptoError::DigestUnavailable(
                "derived copy does not carry its concealed message".into(),
            ));
        }
        let subject_leaf = digest::leaf_opt(self.concealed_subject.as_ref());
        let message_leaf = digest::leaf_opt(self.concealed_message.as_ref());
        Ok(digest::pair_digest(
            subject_leaf.as_deref(),
            message_leaf.as_deref(),
        ))
    }

    /// Verify every recipient signature against the sender's public key.
    pub fn verify_signatures(&self) -> Result<(), CryptoError> {
        let public = cdm_crypto::PublicKeyBytes::from_b64(&self.from.sender_public_key)?;
        let signing_digest = self.signing_digest()?;
        for recipient in &self.recipients {
            let sig = URL_SAFE_NO_PAD.decode(&recipient.signature)?;
            SeedKeyPair::verify(&public.0, &signing_digest, &sig)?;
        }
        Ok(())
    }
}

// ── Database operation envelopes ──────────────────────────────────────────────

/// Schema-definition envelope: declares a table and one fresh concealment
/// seed per column. Signed by the operator identity with itself as the only
/// recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCdm {
    pub create: CreateOp,
    pub recipients: Vec<RecipientSignature>,
    pub from: Sender,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOp {
    pub table: String,
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    /// Fresh random concealment seed for this column.
    pub seed: String,
}

/// Row-insertion envelope referencing pre-existing encrypted column/table
/// identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertCdm {
    pub table: String,
    pub insert: InsertOp,
    pub recipients: Vec<RecipientSignature>,
    pub from: Sender,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertOp {
    pub table: String,
    pub data: Vec<RowEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowEntry {
    pub column: NamedRef,
    pub table: NamedRef,
    pub value: String,
}

/// Encrypted identifier reference: cleartext name plus the hash and
/// ciphertext under which the directory knows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
    pub hash: String,
    pub ciphertext: String,
}

impl CreateOp {
    /// Signing digest over the canonical form of this operation.
    /// Field ordering MUST be stable (`json!` sorts alphabetically).
    pub fn signing_digest(&self) -> [u8; 32] {
        let canonical = serde_json::json!({
            "columns": self.columns,
            "table": self.table,
        });
        digest::sha256(&serde_json::to_vec(&canonical).unwrap_or_default())
    }
}

impl InsertOp {
    /// Signing digest over the canonical form of this operation.
    pub fn signing_digest(&self) -> [u8; 32] {
        let canonical = serde_json::json!({
            "data": self.data,
            "table": self.table,
        });
        digest::sha256(&serde_json::to_vec(&canonical).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted_on_the_wire() {
        let cdm = ChatCdm {
            subject: "Hi".into(),
            message: "Hello".into(),
            concealed_subject: Some(ConcealedValue::new("x-hi")),
            concealed_message: Some(ConcealedValue::new("x-hello")),
            regarding: None,
            forwarded: None,
            recipients: vec![],
            from: Sender { sender_public_key: "k".into() },
        };
        let json = serde_json::to_string(&cdm).unwrap();
        assert!(!json.contains("regarding"));
        assert!(!json.contains("forwarded"));
    }

    #[test]
    fn recipient_role_wire_names() {
        assert_eq!(serde_json::to_string(&RecipientRole::To).unwrap(), "\"to\"");
        assert_eq!(serde_json::to_string(&RecipientRole::Cc).unwrap(), "\"cc\"");
    }

    #[test]
    fn cdm_variants_are_tagged() {
        let cdm = Cdm::Create(CreateCdm {
            create: CreateOp { table: "users".into(), columns: vec![] },
            recipients: vec![],
            from: Sender { sender_public_key: "k".into() },
        });
        let json = serde_json::to_string(&cdm).unwrap();
        assert!(json.contains("\"kind\":\"create\""));
    }

    #[test]
    fn create_op_digest_is_stable() {
        let op = CreateOp {
            table: "users".into(),
            columns: vec![ColumnSpec { name: "name".into(), seed: "s1".into() }],
        };
        assert_eq!(op.signing_digest(), op.signing_digest());

        let other = CreateOp {
            table: "people".into(),
            columns: vec![ColumnSpec { name: "name".into(), seed: "s1".into() }],
        };
        assert_ne!(op.signing_digest(), other.signing_digest());
    }
}
