//! Classification of peer signature batches
//!
//! Group of five, member 1 verifying. Member 1 prefers the result hashing to
//! `h1`; `h2` is a competing candidate.

use std::collections::BTreeMap;
use std::sync::Arc;

use beacon_chain::{LocalChain, RelayConfig};
use beacon_core::{DkgResult, MemberKeyPair, ParticipantIndex, ResultHash, Signature};
use beacon_resultsig::{Accusations, DkgResultHashSignatureMessage, ResultSigningMember, Roster};
use rand::rngs::OsRng;

type Member = ResultSigningMember<Arc<LocalChain>>;

fn index(i: u16) -> ParticipantIndex {
    ParticipantIndex::new(i).unwrap()
}

fn message(sender: u16, hash: ResultHash, signature: &Signature) -> DkgResultHashSignatureMessage {
    DkgResultHashSignatureMessage::new(index(sender), hash, signature.clone())
}

struct Fixture {
    members: Vec<Member>,
    h1: ResultHash,
    h2: ResultHash,
}

impl Fixture {
    fn new(group_size: u16, threshold: u16) -> Self {
        let chain = Arc::new(LocalChain::connect(RelayConfig::new(group_size, threshold)).unwrap());

        let key_pairs: Vec<MemberKeyPair> = (0..group_size)
            .map(|_| MemberKeyPair::generate(&mut OsRng))
            .collect();
        let keys: BTreeMap<_, _> = key_pairs
            .iter()
            .zip(ParticipantIndex::all(group_size))
            .map(|(kp, i)| (i, *kp.public_key()))
            .collect();

        let members = key_pairs
            .into_iter()
            .zip(ParticipantIndex::all(group_size))
            .map(|(kp, i)| {
                ResultSigningMember::new(i, kp, Roster::peers_of(i, &keys), Arc::clone(&chain))
                    .unwrap()
            })
            .collect();

        let r1 = DkgResult::new(vec![10], vec![]);
        let r2 = DkgResult::new(vec![20], vec![]);
        let h1 = chain.calculate_result_hash(&r1).unwrap();
        let h2 = chain.calculate_result_hash(&r2).unwrap();

        let mut fixture = Self { members, h1, h2 };
        let own = fixture.members[0].sign_dkg_result(&r1).unwrap();
        assert_eq!(*own.result_hash(), h1);
        fixture
    }

    fn sign(&self, member: u16, hash: &ResultHash) -> Signature {
        self.members[usize::from(member) - 1].sign(hash).unwrap()
    }

    fn verify(
        &mut self,
        batch: &[DkgResultHashSignatureMessage],
    ) -> beacon_resultsig::Result<Accusations> {
        self.members[0].verify_dkg_result_signatures(batch)
    }

    /// Accepted signatures excluding the verifier's own
    fn accepted_peers(&self) -> BTreeMap<ParticipantIndex, Signature> {
        let mut accepted = self.members[0].valid_result_signatures().clone();
        accepted.remove(&index(1));
        accepted
    }
}

#[test]
fn test_valid_signatures_for_preferred_result() {
    let mut f = Fixture::new(5, 3);
    let s21 = f.sign(2, &f.h1);
    let s31 = f.sign(3, &f.h1);

    let accusations = f.verify(&[message(2, f.h1, &s21), message(3, f.h1, &s31)]).unwrap();

    assert!(accusations.is_empty());
    let expected: BTreeMap<_, _> = [(index(2), s21), (index(3), s31)].into_iter().collect();
    assert_eq!(f.accepted_peers(), expected);
}

#[test]
fn test_duplicated_signatures_for_preferred_result() {
    let mut f = Fixture::new(5, 3);
    let s311 = f.sign(3, &f.h1);
    let s312 = f.sign(3, &f.h1);
    assert_ne!(s311, s312);

    let accusations = f
        .verify(&[
            message(3, f.h1, &s311),
            message(3, f.h1, &s312),
            message(3, f.h1, &s311),
        ])
        .unwrap();

    let expected: Accusations = [(index(3), vec![s311.clone(), s312, s311])]
        .into_iter()
        .collect();
    assert_eq!(accusations, expected);
    assert!(f.accepted_peers().is_empty());
}

#[test]
fn test_signatures_for_two_different_results() {
    let mut f = Fixture::new(5, 3);
    let s411 = f.sign(4, &f.h1);
    let s421 = f.sign(4, &f.h2);

    let accusations = f.verify(&[message(4, f.h1, &s411), message(4, f.h2, &s421)]).unwrap();

    let expected: Accusations = [(index(4), vec![s411, s421])].into_iter().collect();
    assert_eq!(accusations, expected);
    assert!(f.accepted_peers().is_empty());
}

#[test]
fn test_signature_for_different_result_is_ignored() {
    let mut f = Fixture::new(5, 3);
    let s52 = f.sign(5, &f.h2);

    let accusations = f.verify(&[message(5, f.h2, &s52)]).unwrap();

    assert!(accusations.is_empty());
    assert!(f.accepted_peers().is_empty());
}

#[test]
fn test_malformed_signature_is_ignored() {
    let mut f = Fixture::new(5, 3);

    let accusations = f.verify(&[message(2, f.h1, &Signature::new(vec![99]))]).unwrap();

    assert!(accusations.is_empty());
    assert!(f.accepted_peers().is_empty());
}

#[test]
fn test_wrong_but_well_formed_signature_is_ignored() {
    let mut f = Fixture::new(5, 3);
    // Member 3's signature presented as member 2's
    let s31 = f.sign(3, &f.h1);

    let accusations = f.verify(&[message(2, f.h1, &s31)]).unwrap();

    assert!(accusations.is_empty());
    assert!(f.accepted_peers().is_empty());
}

#[test]
fn test_unknown_sender_is_ignored() {
    let mut f = Fixture::new(3, 2);
    let s21 = f.sign(2, &f.h1);

    let accusations = f.verify(&[message(7, f.h1, &s21)]).unwrap();

    assert!(accusations.is_empty());
    assert!(f.accepted_peers().is_empty());
}

#[test]
fn test_mixed_batch() {
    let mut f = Fixture::new(5, 3);
    let s21 = f.sign(2, &f.h1);
    let s311 = f.sign(3, &f.h1);
    let s312 = f.sign(3, &f.h1);
    let s411 = f.sign(4, &f.h1);
    let s421 = f.sign(4, &f.h2);
    let s52 = f.sign(5, &f.h2);

    let accusations = f
        .verify(&[
            message(2, f.h1, &s21),
            message(3, f.h1, &s311),
            message(3, f.h1, &s312),
            message(4, f.h1, &s411),
            message(4, f.h2, &s421),
            message(5, f.h2, &s52),
        ])
        .unwrap();

    let expected_accusations: Accusations = [
        (index(3), vec![s311, s312]),
        (index(4), vec![s411, s421]),
    ]
    .into_iter()
    .collect();
    assert_eq!(accusations, expected_accusations);

    let expected_accepted: BTreeMap<_, _> = [(index(2), s21)].into_iter().collect();
    assert_eq!(f.accepted_peers(), expected_accepted);
}

#[test]
fn test_interleaved_arrival_order_is_kept_per_sender() {
    let mut f = Fixture::new(5, 3);
    let s31 = f.sign(3, &f.h1);
    let s21 = f.sign(2, &f.h1);
    let s32 = f.sign(3, &f.h2);

    let accusations = f
        .verify(&[
            message(3, f.h1, &s31),
            message(2, f.h1, &s21),
            message(3, f.h2, &s32),
        ])
        .unwrap();

    assert_eq!(accusations.get(&index(3)), Some(&vec![s31, s32]));
    assert_eq!(f.accepted_peers().get(&index(2)), Some(&s21));
}

#[test]
fn test_accusation_revokes_earlier_acceptance() {
    let mut f = Fixture::new(5, 3);
    let s21 = f.sign(2, &f.h1);
    let s22 = f.sign(2, &f.h1);

    f.verify(&[message(2, f.h1, &s21)]).unwrap();
    assert!(f.accepted_peers().contains_key(&index(2)));

    let accusations = f.verify(&[message(2, f.h1, &s21), message(2, f.h1, &s22)]).unwrap();

    assert_eq!(accusations.get(&index(2)), Some(&vec![s21, s22]));
    assert!(f.accepted_peers().is_empty());
}

#[test]
fn test_accused_member_is_not_accepted_on_replay() {
    let mut f = Fixture::new(3, 2);
    let s31 = f.sign(3, &f.h1);
    let s32 = f.sign(3, &f.h1);

    let accusations = f.verify(&[message(3, f.h1, &s31), message(3, f.h1, &s32)]).unwrap();
    assert!(accusations.contains_key(&index(3)));

    for replayed in [&s31, &s32] {
        let accusations = f.verify(&[message(3, f.h1, replayed)]).unwrap();
        assert!(accusations.is_empty());
        assert!(f.accepted_peers().is_empty());
    }
}

#[test]
fn test_round_trip_for_whole_group() {
    let group_size = 10;
    let mut f = Fixture::new(group_size, 5);
    let result = DkgResult::new(vec![10], vec![]);

    let mut messages = Vec::new();
    for member in f.members.iter_mut().skip(1) {
        let message = member.sign_dkg_result(&result).unwrap();
        assert_eq!(message.sender_index(), member.index());
        assert_eq!(*message.result_hash(), f.h1);
        assert!(member.verify_signature(
            message.sender_index(),
            message.result_hash(),
            message.signature()
        ));
        assert_eq!(member.valid_result_signatures().len(), 1);
        messages.push(message);
    }

    let accusations = f.verify(&messages).unwrap();
    assert!(accusations.is_empty());

    let accepted = f.members[0].valid_result_signatures();
    assert_eq!(accepted.len(), usize::from(group_size));
    for message in &messages {
        assert_eq!(accepted.get(&message.sender_index()), Some(message.signature()));
    }
}
