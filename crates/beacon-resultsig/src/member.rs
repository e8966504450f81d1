//! Result signing member
//!
//! Every group member signs the hash of the DKG result it computed, then
//! collects its peers' signatures over the same hash. Incoming messages are
//! grouped by sender and each sender ends up in exactly one of three states
//! for a verification pass:
//!
//! - **accepted**: a single message over the preferred hash with a valid
//!   signature. The signature joins the set submitted with the result.
//! - **ignored**: a single message over another hash, or one whose signature
//!   does not verify. Neither is proof of misconduct.
//! - **accused**: two or more messages, whatever their hashes. A correct
//!   member sends exactly one, so the signatures are kept as evidence.
//!
//! A member's state belongs to one owner at a time and performs no locking.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use beacon_core::{
    DkgResult, MemberKeyPair, ParticipantIndex, PublicKey, ResultHash, ResultHasher, Signature,
};

use crate::error::{Result, ResultSigningError};
use crate::message::DkgResultHashSignatureMessage;
use crate::roster::Roster;

/// Evidence against equivocating members: accused index to the signatures
/// observed from it, in arrival order
pub type Accusations = BTreeMap<ParticipantIndex, Vec<Signature>>;

/// Per-run signing state of one group member
pub struct ResultSigningMember<H> {
    index: ParticipantIndex,
    key_pair: MemberKeyPair,
    roster: Roster,
    hasher: H,

    /// Hash of the result this member signed; set once per run
    preferred_result_hash: Option<ResultHash>,

    /// At most one signature per member, own signature included
    valid_result_signatures: BTreeMap<ParticipantIndex, Signature>,

    /// Senders accused in any pass; never accepted afterwards
    accused: BTreeSet<ParticipantIndex>,
}

impl<H> std::fmt::Debug for ResultSigningMember<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSigningMember")
            .field("index", &self.index)
            .field("key_pair", &self.key_pair)
            .field("roster_size", &self.roster.len())
            .field("preferred_result_hash", &self.preferred_result_hash)
            .field("valid_result_signatures", &self.valid_result_signatures.len())
            .field("accused", &self.accused)
            .finish()
    }
}

impl<H: ResultHasher> ResultSigningMember<H> {
    /// Create the signing state for one DKG run
    ///
    /// The roster may omit the member itself. If it does list the member,
    /// the key must match the member's own public key.
    pub fn new(
        index: ParticipantIndex,
        key_pair: MemberKeyPair,
        roster: Roster,
        hasher: H,
    ) -> Result<Self> {
        if let Some(listed) = roster.public_key(index) {
            if listed != key_pair.public_key() {
                return Err(ResultSigningError::InvalidRoster(format!(
                    "roster lists a different public key for member {}",
                    index
                )));
            }
        }

        Ok(Self {
            index,
            key_pair,
            roster,
            hasher,
            preferred_result_hash: None,
            valid_result_signatures: BTreeMap::new(),
            accused: BTreeSet::new(),
        })
    }

    pub fn index(&self) -> ParticipantIndex {
        self.index
    }

    pub fn public_key(&self) -> &PublicKey {
        self.key_pair.public_key()
    }

    /// Hash of the result this member signed, if any
    pub fn preferred_result_hash(&self) -> Option<ResultHash> {
        self.preferred_result_hash
    }

    /// Signatures accepted so far, own signature included
    pub fn valid_result_signatures(&self) -> &BTreeMap<ParticipantIndex, Signature> {
        &self.valid_result_signatures
    }

    /// Senders accused so far in this run
    pub fn accused(&self) -> &BTreeSet<ParticipantIndex> {
        &self.accused
    }

    /// Hand the accepted signatures over for submission, ending the run
    pub fn into_signatures(self) -> BTreeMap<ParticipantIndex, Signature> {
        self.valid_result_signatures
    }

    /// Sign the hash of the result this member computed
    ///
    /// Records the hash as this member's preferred result and trusts its own
    /// signature without re-verifying it. Only one result may be signed per
    /// run; state is left untouched if hashing or signing fails.
    pub fn sign_dkg_result(&mut self, result: &DkgResult) -> Result<DkgResultHashSignatureMessage> {
        if let Some(preferred) = self.preferred_result_hash {
            return Err(ResultSigningError::AlreadySigned {
                index: self.index,
                preferred,
            });
        }

        let result_hash = self
            .hasher
            .calculate_result_hash(result)
            .map_err(ResultSigningError::HashComputation)?;
        let signature = self.sign(&result_hash)?;

        self.preferred_result_hash = Some(result_hash);
        self.valid_result_signatures
            .insert(self.index, signature.clone());

        info!(
            "Member {} signed DKG result {}",
            self.index,
            result_hash.short()
        );

        Ok(DkgResultHashSignatureMessage::new(
            self.index,
            result_hash,
            signature,
        ))
    }

    /// Sign a result hash with this member's key
    pub fn sign(&self, result_hash: &ResultHash) -> Result<Signature> {
        self.key_pair
            .sign(result_hash)
            .map_err(ResultSigningError::Signing)
    }

    /// Public key of a member as known to this member
    fn public_key_of(&self, index: ParticipantIndex) -> Option<&PublicKey> {
        if index == self.index {
            return Some(self.key_pair.public_key());
        }
        self.roster.public_key(index)
    }

    /// Check a signature against the sender's public key
    ///
    /// An index unknown to the roster never verifies.
    pub fn verify_signature(
        &self,
        sender_index: ParticipantIndex,
        result_hash: &ResultHash,
        signature: &Signature,
    ) -> bool {
        match self.public_key_of(sender_index) {
            Some(public_key) => public_key.verify(result_hash, signature),
            None => false,
        }
    }

    /// Classify a batch of peer messages
    ///
    /// Accepted signatures accumulate across calls. The returned accusations
    /// cover only this batch; a sender accused once is never accepted again
    /// in this run. Messages claiming this member's own index are
    /// skipped. No message content can make this fail; the only error is
    /// calling it before [`Self::sign_dkg_result`].
    pub fn verify_dkg_result_signatures(
        &mut self,
        messages: &[DkgResultHashSignatureMessage],
    ) -> Result<Accusations> {
        let preferred = self
            .preferred_result_hash
            .ok_or(ResultSigningError::NotSigned(self.index))?;

        let mut by_sender: BTreeMap<ParticipantIndex, Vec<&DkgResultHashSignatureMessage>> =
            BTreeMap::new();
        for message in messages {
            if message.sender_index() == self.index {
                warn!(
                    "Member {} received a message carrying its own index, skipping",
                    self.index
                );
                continue;
            }
            by_sender
                .entry(message.sender_index())
                .or_default()
                .push(message);
        }

        let mut accusations = Accusations::new();
        for (sender, received) in by_sender {
            match received.as_slice() {
                [message] => {
                    if let Some(evidence) = self.classify_single(sender, message, &preferred) {
                        accusations.insert(sender, evidence);
                    }
                }
                _ => {
                    warn!(
                        "Member {} accuses member {}: {} messages received",
                        self.index,
                        sender,
                        received.len()
                    );
                    self.revoke(sender);
                    accusations.insert(
                        sender,
                        received.iter().map(|m| m.signature().clone()).collect(),
                    );
                }
            }
        }
        self.accused.extend(accusations.keys().copied());

        debug!(
            "Member {} holds {} valid signatures, {} accusations this pass",
            self.index,
            self.valid_result_signatures.len(),
            accusations.len()
        );

        Ok(accusations)
    }

    /// Classify the only message a sender sent in this pass
    ///
    /// Returns evidence when the sender turns out to have equivocated
    /// against a signature accepted in an earlier pass.
    fn classify_single(
        &mut self,
        sender: ParticipantIndex,
        message: &DkgResultHashSignatureMessage,
        preferred: &ResultHash,
    ) -> Option<Vec<Signature>> {
        if self.accused.contains(&sender) {
            debug!("Ignoring message from accused member {}", sender);
            return None;
        }

        if let Some(earlier) = self.valid_result_signatures.get(&sender) {
            if earlier == message.signature() {
                debug!("Member {} re-delivered its accepted signature", sender);
                return None;
            }
            // A late message counts as evidence only if it verifies
            if !self.verify_signature(sender, message.result_hash(), message.signature()) {
                debug!(
                    "Ignoring unverifiable late message from accepted member {}",
                    sender
                );
                return None;
            }
            let earlier = earlier.clone();
            warn!(
                "Member {} accuses member {}: second signature after acceptance",
                self.index, sender
            );
            self.revoke(sender);
            return Some(vec![earlier, message.signature().clone()]);
        }

        if message.result_hash() != preferred {
            debug!(
                "Member {} voted for result {}, ours is {}",
                sender,
                message.result_hash().short(),
                preferred.short()
            );
            return None;
        }

        if !self.verify_signature(sender, preferred, message.signature()) {
            debug!("Invalid signature from member {}", sender);
            return None;
        }

        debug!("Accepted signature from member {}", sender);
        self.valid_result_signatures
            .insert(sender, message.signature().clone());
        None
    }

    fn revoke(&mut self, sender: ParticipantIndex) {
        if self.valid_result_signatures.remove(&sender).is_some() {
            warn!(
                "Member {} revoked previously accepted signature of member {}",
                self.index, sender
            );
        }
    }
}
