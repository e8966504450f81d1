#![no_main]

use std::collections::{BTreeMap, BTreeSet};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use beacon_core::{
    DkgResult, MemberKeyPair, ParticipantIndex, ResultHash, Sha3ResultHasher, Signature,
};
use beacon_resultsig::{DkgResultHashSignatureMessage, ResultSigningMember, Roster};

#[derive(Debug, Arbitrary)]
struct RawMessage {
    sender: u16,
    hash: [u8; 32],
    signature: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
struct Input {
    group_public_key: Vec<u8>,
    batches: Vec<Vec<RawMessage>>,
}

fuzz_target!(|input: Input| {
    let key_pairs: Vec<MemberKeyPair> = (1..=4u8)
        .map(|i| MemberKeyPair::from_secret_bytes(&[i; 32]).unwrap())
        .collect();
    let keys: BTreeMap<_, _> = ParticipantIndex::all(4)
        .zip(&key_pairs)
        .map(|(i, kp)| (i, *kp.public_key()))
        .collect();
    let own = ParticipantIndex::new(1).unwrap();
    let key_pair = key_pairs.into_iter().next().unwrap();
    let mut member =
        ResultSigningMember::new(own, key_pair, Roster::peers_of(own, &keys), Sha3ResultHasher)
            .unwrap();

    let own_message = member
        .sign_dkg_result(&DkgResult::new(input.group_public_key, Vec::new()))
        .unwrap();

    let mut accused_earlier = BTreeSet::new();
    for batch in input.batches {
        let messages: Vec<_> = batch
            .into_iter()
            .filter_map(|raw| {
                let sender = ParticipantIndex::new(raw.sender).ok()?;
                Some(DkgResultHashSignatureMessage::new(
                    sender,
                    ResultHash::new(raw.hash),
                    Signature::new(raw.signature),
                ))
            })
            .collect();

        // Peer content never makes verification fail
        let accusations = member.verify_dkg_result_signatures(&messages).unwrap();
        assert!(!accusations.contains_key(&own));

        // Own signature is never displaced
        assert_eq!(
            member.valid_result_signatures().get(&own),
            Some(own_message.signature())
        );
        assert!(member.valid_result_signatures().len() <= 4);

        // Once accused, never accepted again
        for sender in &accused_earlier {
            assert!(!member.valid_result_signatures().contains_key(sender));
        }
        accused_earlier.extend(accusations.into_keys());
    }
});
