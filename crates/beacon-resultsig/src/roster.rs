//! Peer public key roster

use std::collections::BTreeMap;

use beacon_core::{ParticipantIndex, PublicKey};

/// Immutable mapping from peer index to public key
///
/// Resolved by group formation before signing starts and never modified
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    keys: BTreeMap<ParticipantIndex, PublicKey>,
}

impl Roster {
    pub fn new(keys: BTreeMap<ParticipantIndex, PublicKey>) -> Self {
        Self { keys }
    }

    pub fn public_key(&self, index: ParticipantIndex) -> Option<&PublicKey> {
        self.keys.get(&index)
    }

    pub fn contains(&self, index: ParticipantIndex) -> bool {
        self.keys.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantIndex, &PublicKey)> {
        self.keys.iter()
    }

    /// Roster of everyone in `keys` except `own`
    pub fn peers_of(own: ParticipantIndex, keys: &BTreeMap<ParticipantIndex, PublicKey>) -> Self {
        keys.iter()
            .filter(|(index, _)| **index != own)
            .map(|(index, key)| (*index, *key))
            .collect()
    }
}

impl FromIterator<(ParticipantIndex, PublicKey)> for Roster {
    fn from_iter<I: IntoIterator<Item = (ParticipantIndex, PublicKey)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
