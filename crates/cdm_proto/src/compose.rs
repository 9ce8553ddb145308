//! The Envelope Composer.
//!
//! Builds chat CDMs — new thread start, threaded reply, or membership-change
//! broadcast with forwarded history — computing the digest chain and
//! collecting per-recipient signatures. Composition never submits anything;
//! the Dispatch Sequencer owns that.
//!
//! Digest chain recap (see `cdm_crypto::digest`):
//!   leaf(half)  = hex SHA-256 of the concealed half
//!   digest(cdm) = SHA-256( leaf(subject)? || leaf(message)? )
//! with absent halves skipped outright. Every recipient of a CDM receives
//! the same Ed25519 signature over that CDM's own digest.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

use cdm_crypto::conceal::{Conceal, ConcealedValue};
use cdm_crypto::{digest, SeedKeyPair};

use crate::envelope::{ChatCdm, DigestPair, RecipientRole, RecipientSignature, Sender};
use crate::thread::Thread;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Thread has no history to build on")]
    EmptyThread,
}

/// Per-conversation composer. Holds the concealment capability; signing
/// seeds are passed per operation so one composer can serve any sender.
pub struct Composer<C> {
    concealer: C,
}

impl<C: Conceal> Composer<C> {
    pub fn new(concealer: C) -> Self {
        Self { concealer }
    }

    /// Compose the first CDM of a new thread.
    ///
    /// Every recipient gets `role = to` and the same signature over the
    /// envelope digest. No chaining references yet.
    pub fn compose_new_message(
        &self,
        subject: &str,
        message: &str,
        recipients: &[String],
        sender_seed: &str,
    ) -> ChatCdm {
        let keys = SeedKeyPair::from_seed(sender_seed);
        let concealed_subject = self.concealer.conceal(subject);
        let concealed_message = self.concealer.conceal(message);
        let signing_digest = halves_digest(concealed_subject.as_ref(), concealed_message.as_ref());

        ChatCdm {
            subject: subject.trim().to_string(),
            message: message.trim().to_string(),
            concealed_subject,
            concealed_message,
            regarding: None,
            forwarded: None,
            recipients: sign_fan_out(recipients.iter(), RecipientRole::To, &keys, &signing_digest),
            from: sender(&keys),
        }
    }

    /// Compose a reply into an existing thread.
    ///
    /// `regarding` points at the thread root's stored digests; the fan-out
    /// is the current member list with `role = cc`.
    pub fn compose_reply(
        &self,
        thread: &Thread,
        subject: &str,
        message: &str,
        sender_seed: &str,
    ) -> Result<ChatCdm, ComposeError> {
        let root = thread.root().ok_or(ComposeError::EmptyThread)?;

        let keys = SeedKeyPair::from_seed(sender_seed);
        let concealed_subject = self.concealer.conceal(subject);
        let concealed_message = self.concealer.conceal(message);
        let signing_digest = halves_digest(concealed_subject.as_ref(), concealed_message.as_ref());

        Ok(ChatCdm {
            subject: subject.trim().to_string(),
            message: message.trim().to_string(),
            concealed_subject,
            concealed_message,
            regarding: Some(DigestPair {
                subject: root.subject_digest.clone(),
                message: root.message_digest.clone(),
            }),
            forwarded: None,
            recipients: sign_fan_out(
                thread.members.iter(),
                RecipientRole::Cc,
                &keys,
                &signing_digest,
            ),
            from: sender(&keys),
        })
    }

    /// Broadcast a membership change: one announcement CDM followed by one
    /// forwarded copy of every CDM already in the thread.
    ///
    /// The root's subject/message are re-concealed with a FRESH secret; the
    /// announcement and every non-root copy point `regarding` at those fresh
    /// leaves, and the root's own copy alone carries the fresh concealed
    /// values. Forwarding the root suppresses `regarding` entirely — a
    /// digest self-loop would be meaningless.
    pub fn compose_membership_change(
        &self,
        thread: &Thread,
        new_members: &[String],
        sender_seed: &str,
    ) -> Result<Vec<ChatCdm>, ComposeError> {
        let root = thread.root().ok_or(ComposeError::EmptyThread)?;
        let keys = SeedKeyPair::from_seed(sender_seed);

        // Fresh concealment of the root's plaintext, shared by the whole
        // broadcast as the `regarding` anchor.
        let fwd_root_subject = self.concealer.conceal(&root.subject);
        let fwd_root_message = self.concealer.conceal(&root.message);
        let root_anchor = DigestPair {
            subject: digest::leaf_opt(fwd_root_subject.as_ref()),
            message: digest::leaf_opt(fwd_root_message.as_ref()),
        };
        let root_id = root.id.clone();

        let noun = if new_members.len() > 1 { "members" } else { "member" };
        let message = format!("Added new {noun}: {}", new_members.join(","));
        let concealed_message = self.concealer.conceal(&message);
        let announcement_digest = halves_digest(None, concealed_message.as_ref());

        let fan_out: Vec<String> = union(&thread.members, new_members);

        let mut cdms = Vec::with_capacity(thread.cdms.len() + 1);
        cdms.push(ChatCdm {
            subject: String::new(),
            message,
            concealed_subject: None,
            concealed_message,
            regarding: Some(root_anchor.clone()),
            forwarded: None,
            recipients: sign_fan_out(
                fan_out.iter(),
                RecipientRole::To,
                &keys,
                &announcement_digest,
            ),
            from: sender(&keys),
        });

        for cdm in &thread.cdms {
            let copy_digest = halves_digest(
                cdm.concealed_subject.as_ref(),
                cdm.concealed_message.as_ref(),
            );
            let is_root = cdm.id == root_id;

            cdms.push(ChatCdm {
                subject: cdm.subject.clone(),
                message: cdm.message.clone(),
                concealed_subject: if is_root { fwd_root_subject.clone() } else { None },
                concealed_message: if is_root { fwd_root_message.clone() } else { None },
                regarding: if is_root { None } else { Some(root_anchor.clone()) },
                forwarded: Some(DigestPair {
                    subject: cdm.subject_digest.clone(),
                    message: cdm.message_digest.clone(),
                }),
                recipients: sign_fan_out(fan_out.iter(), RecipientRole::To, &keys, &copy_digest),
                from: sender(&keys),
            });
        }

        Ok(cdms)
    }
}

/// Signing digest over two optional concealed halves.
fn halves_digest(subject: Option<&ConcealedValue>, message: Option<&ConcealedValue>) -> [u8; 32] {
    let subject_leaf = digest::leaf_opt(subject);
    let message_leaf = digest::leaf_opt(message);
    digest::pair_digest(subject_leaf.as_deref(), message_leaf.as_deref())
}

/// Sign once, fan out to every recipient with identical signature bytes.
fn sign_fan_out<'a>(
    recipients: impl Iterator<Item = &'a String>,
    role: RecipientRole,
    keys: &SeedKeyPair,
    signing_digest: &[u8; 32],
) -> Vec<RecipientSignature> {
    let signature = URL_SAFE_NO_PAD.encode(keys.sign(signing_digest));
    recipients
        .map(|recipient| RecipientSignature {
            recipient: recipient.clone(),
            role,
            signature: signature.clone(),
        })
        .collect()
}

fn sender(keys: &SeedKeyPair) -> Sender {
    Sender {
        sender_public_key: keys.public_b64(),
    }
}

/// Order-preserving union of existing and new member identities.
fn union(members: &[String], new_members: &[String]) -> Vec<String> {
    let mut out: Vec<String> = members.to_vec();
    for candidate in new_members {
        if !out.contains(candidate) {
            out.push(candidate.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::ThreadCdm;

    /// Deterministic stand-in for the external concealment transform.
    struct FakeConceal;

    impl Conceal for FakeConceal {
        fn conceal(&self, plaintext: &str) -> Option<ConcealedValue> {
            if plaintext.is_empty() {
                None
            } else {
                Some(ConcealedValue::new(format!("~{plaintext}~")))
            }
        }
    }

    fn composer() -> Composer<FakeConceal> {
        Composer::new(FakeConceal)
    }

    fn stored(id: &str, subject: &str, message: &str) -> ThreadCdm {
        let concealed_subject = FakeConceal.conceal(subject);
        let concealed_message = FakeConceal.conceal(message);
        ThreadCdm {
            id: id.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            subject_digest: digest::leaf_opt(concealed_subject.as_ref()),
            message_digest: digest::leaf_opt(concealed_message.as_ref()),
            concealed_subject,
            concealed_message,
        }
    }

    #[test]
    fn new_message_shares_one_signature_across_recipients() {
        let cdm = composer().compose_new_message(
            "Hi",
            "Hello",
            &["r1".to_string(), "r2".to_string()],
            "sender seed",
        );

        assert_eq!(cdm.recipients.len(), 2);
        assert_eq!(cdm.recipients[0].signature, cdm.recipients[1].signature);
        assert!(cdm.recipients.iter().all(|r| r.role == RecipientRole::To));
        assert!(cdm.regarding.is_none());
        assert!(cdm.forwarded.is_none());
        cdm.verify_signatures().unwrap();
    }

    #[test]
    fn new_message_digest_matches_leaf_concatenation() {
        let cdm = composer().compose_new_message("Hi", "Hello", &["r1".to_string()], "seed");

        let subject_leaf = digest::sha256_hex(b"~Hi~");
        let message_leaf = digest::sha256_hex(b"~Hello~");
        let expected = digest::pair_digest(Some(&subject_leaf), Some(&message_leaf));
        assert_eq!(cdm.signing_digest().unwrap(), expected);
    }

    #[test]
    fn empty_subject_skips_its_half() {
        let cdm = composer().compose_new_message("", "Hello", &["r1".to_string()], "seed");

        assert!(cdm.concealed_subject.is_none());
        let message_leaf = digest::sha256_hex(b"~Hello~");
        assert_eq!(
            cdm.signing_digest().unwrap(),
            digest::pair_digest(None, Some(&message_leaf)),
        );
        cdm.verify_signatures().unwrap();
    }

    #[test]
    fn cleartext_copies_are_trimmed() {
        let cdm = composer().compose_new_message("  Hi ", " Hello\n", &["r1".to_string()], "seed");
        assert_eq!(cdm.subject, "Hi");
        assert_eq!(cdm.message, "Hello");
    }

    #[test]
    fn reply_fails_on_empty_thread() {
        let thread = Thread { cdms: vec![], members: vec!["m1".to_string()] };
        let err = composer()
            .compose_reply(&thread, "Re", "body", "seed")
            .unwrap_err();
        assert!(matches!(err, ComposeError::EmptyThread));
    }

    #[test]
    fn reply_points_regarding_at_root_and_ccs_members() {
        let thread = Thread {
            cdms: vec![stored("c0", "Hi", "Hello")],
            members: vec!["m1".to_string(), "m2".to_string()],
        };
        let cdm = composer()
            .compose_reply(&thread, "Re", "got it", "seed")
            .unwrap();

        let regarding = cdm.regarding.unwrap();
        assert_eq!(regarding.subject, thread.cdms[0].subject_digest);
        assert_eq!(regarding.message, thread.cdms[0].message_digest);
        assert_eq!(cdm.recipients.len(), 2);
        assert!(cdm.recipients.iter().all(|r| r.role == RecipientRole::Cc));
        assert!(cdm.forwarded.is_none());
    }

    #[test]
    fn membership_change_emits_history_plus_announcement() {
        let thread = Thread {
            cdms: vec![
                stored("c0", "Hi", "Hello"),
                stored("c1", "Re", "got it"),
                stored("c2", "", "and more"),
            ],
            members: vec!["m1".to_string()],
        };
        let cdms = composer()
            .compose_membership_change(&thread, &["n1".to_string()], "seed")
            .unwrap();

        assert_eq!(cdms.len(), thread.cdms.len() + 1);

        // Announcement: empty subject, generated text, anchored at the
        // re-concealed root, fan-out covers old and new members.
        let announcement = &cdms[0];
        assert_eq!(announcement.subject, "");
        assert_eq!(announcement.message, "Added new member: n1");
        assert!(announcement.concealed_subject.is_none());
        assert!(announcement.regarding.is_some());
        assert!(announcement.forwarded.is_none());
        let fan_out: Vec<_> = announcement.recipients.iter().map(|r| r.recipient.as_str()).collect();
        assert_eq!(fan_out, ["m1", "n1"]);
        assert!(announcement.recipients.iter().all(|r| r.role == RecipientRole::To));

        // Root copy: regarding suppressed, fresh concealment carried.
        let root_copy = &cdms[1];
        assert!(root_copy.regarding.is_none());
        assert!(root_copy.concealed_subject.is_some());
        assert!(root_copy.concealed_message.is_some());
        assert_eq!(
            root_copy.forwarded.as_ref().unwrap().subject,
            thread.cdms[0].subject_digest,
        );

        // Later copies: no concealment, regarding anchored at the root.
        let later = &cdms[2];
        assert!(later.concealed_subject.is_none());
        assert!(later.concealed_message.is_none());
        assert_eq!(later.regarding, announcement.regarding);
        assert_eq!(
            later.forwarded.as_ref().unwrap().message,
            thread.cdms[1].message_digest,
        );
    }

    #[test]
    fn membership_change_pluralises_announcement() {
        let thread = Thread {
            cdms: vec![stored("c0", "Hi", "Hello")],
            members: vec!["m1".to_string()],
        };
        let cdms = composer()
            .compose_membership_change(&thread, &["n1".to_string(), "n2".to_string()], "seed")
            .unwrap();
        assert_eq!(cdms[0].message, "Added new members: n1,n2");
    }

    #[test]
    fn membership_change_fails_on_empty_thread() {
        let thread = Thread { cdms: vec![], members: vec![] };
        let err = composer()
            .compose_membership_change(&thread, &["n1".to_string()], "seed")
            .unwrap_err();
        assert!(matches!(err, ComposeError::EmptyThread));
    }

    #[test]
    fn fan_out_deduplicates_existing_members() {
        let thread = Thread {
            cdms: vec![stored("c0", "Hi", "Hello")],
            members: vec!["m1".to_string(), "n1".to_string()],
        };
        let cdms = composer()
            .compose_membership_change(&thread, &["n1".to_string()], "seed")
            .unwrap();
        let fan_out: Vec<_> = cdms[0].recipients.iter().map(|r| r.recipient.as_str()).collect();
        assert_eq!(fan_out, ["m1", "n1"]);
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let mut cdm = composer().compose_new_message("Hi", "Hello", &["r1".to_string()], "seed");
        cdm.concealed_message = Some(ConcealedValue::new("~Tampered~"));
        assert!(cdm.verify_signatures().is_err());
    }
}
