//! In-memory ledger stub
//!
//! Stands in for the on-chain threshold relay contract during tests and
//! simulations: it hashes candidate results, enforces the honest-threshold
//! rule on submission and publishes the resulting events.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use beacon_core::{
    DkgResult, ParticipantIndex, ResultHash, ResultHasher, Sha3ResultHasher, Signature,
};

use crate::config::RelayConfig;
use crate::error::{ChainError, Result};
use crate::events::{DkgResultSubmission, EventBus, GroupRegistration, Subscription};

/// Group public key registered when the chain is connected
pub const SEED_GROUP_PUBLIC_KEY: &[u8] = b"seed to group public key";

/// A group known to the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalGroup {
    pub group_public_key: Vec<u8>,
    pub registration_block_height: u64,
}

/// The last accepted result together with its supporting signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedResult {
    pub result: DkgResult,
    pub signatures: BTreeMap<ParticipantIndex, Signature>,
}

#[derive(Debug)]
struct ChainState {
    groups: Vec<LocalGroup>,
    last_submitted: Option<SubmittedResult>,
    current_block: u64,
}

/// Local chain implementation
pub struct LocalChain {
    config: RelayConfig,
    hasher: Arc<dyn ResultHasher + Send + Sync>,
    state: RwLock<ChainState>,
    result_submitted: EventBus<DkgResultSubmission>,
    group_registered: EventBus<GroupRegistration>,
}

impl std::fmt::Debug for LocalChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalChain")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LocalChain {
    /// Connect to a fresh local chain using SHA3-256 result hashing
    pub fn connect(config: RelayConfig) -> Result<Self> {
        Self::with_hasher(config, Arc::new(Sha3ResultHasher))
    }

    /// Connect to a fresh local chain using the given result hasher
    pub fn with_hasher(
        config: RelayConfig,
        hasher: Arc<dyn ResultHasher + Send + Sync>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            "Connecting local chain: group size {}, honest threshold {}",
            config.group_size, config.honest_threshold
        );

        Ok(Self {
            config,
            hasher,
            state: RwLock::new(ChainState {
                groups: vec![LocalGroup {
                    group_public_key: SEED_GROUP_PUBLIC_KEY.to_vec(),
                    registration_block_height: 0,
                }],
                last_submitted: None,
                current_block: 0,
            }),
            result_submitted: EventBus::default(),
            group_registered: EventBus::default(),
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Calculate the hash members sign for a result
    pub fn calculate_result_hash(&self, result: &DkgResult) -> Result<ResultHash> {
        Ok(self.hasher.calculate_result_hash(result)?)
    }

    /// Submit a result supported by the given signatures
    ///
    /// Fails if fewer than `honest_threshold` signatures are supplied. The
    /// signatures themselves are recorded as given.
    pub async fn submit_dkg_result(
        &self,
        submitter: ParticipantIndex,
        result: DkgResult,
        signatures: BTreeMap<ParticipantIndex, Signature>,
    ) -> Result<DkgResultSubmission> {
        if submitter.get() > self.config.group_size {
            return Err(ChainError::UnknownSubmitter {
                index: submitter.get(),
                group_size: self.config.group_size,
            });
        }

        let threshold = usize::from(self.config.honest_threshold);
        if signatures.len() < threshold {
            warn!(
                "Rejecting result from member {}: {} signatures, threshold {}",
                submitter,
                signatures.len(),
                threshold
            );
            return Err(ChainError::InsufficientSignatures {
                got: signatures.len(),
                threshold,
            });
        }

        let mut state = self.state.write().await;
        let block_number = state.current_block;

        let submission = DkgResultSubmission {
            member_index: submitter,
            group_public_key: result.group_public_key.clone(),
            misbehaved: result.misbehaved.clone(),
            block_number,
        };
        let registration = GroupRegistration {
            group_public_key: result.group_public_key.clone(),
            block_number,
        };

        state.groups.push(LocalGroup {
            group_public_key: result.group_public_key.clone(),
            registration_block_height: block_number,
        });
        state.last_submitted = Some(SubmittedResult { result, signatures });
        state.current_block += 1;
        drop(state);

        let notified = self.result_submitted.publish(submission.clone());
        self.group_registered.publish(registration);

        info!(
            "Accepted DKG result from member {} at block {}",
            submitter, block_number
        );
        debug!("Notified {} result submission subscribers", notified);

        Ok(submission)
    }

    /// The last accepted result and its signatures
    pub async fn last_dkg_result(&self) -> Option<SubmittedResult> {
        self.state.read().await.last_submitted.clone()
    }

    pub async fn is_group_registered(&self, group_public_key: &[u8]) -> bool {
        self.state
            .read()
            .await
            .groups
            .iter()
            .any(|g| g.group_public_key == group_public_key)
    }

    pub async fn number_of_groups(&self) -> usize {
        self.state.read().await.groups.len()
    }

    pub async fn current_block(&self) -> u64 {
        self.state.read().await.current_block
    }

    /// Advance the simulated block height
    pub async fn mine_blocks(&self, count: u64) -> u64 {
        let mut state = self.state.write().await;
        state.current_block += count;
        state.current_block
    }

    /// Subscribe to accepted result submissions
    pub fn on_dkg_result_submitted(&self) -> Subscription<DkgResultSubmission> {
        self.result_submitted.subscribe()
    }

    /// Subscribe to group registrations
    pub fn on_group_registered(&self) -> Subscription<GroupRegistration> {
        self.group_registered.subscribe()
    }
}

impl ResultHasher for LocalChain {
    fn calculate_result_hash(&self, result: &DkgResult) -> beacon_core::Result<ResultHash> {
        self.hasher.calculate_result_hash(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::MemberKeyPair;
    use rand::rngs::OsRng;

    fn index(i: u16) -> ParticipantIndex {
        ParticipantIndex::new(i).unwrap()
    }

    fn signatures(count: u16, hash: &ResultHash) -> BTreeMap<ParticipantIndex, Signature> {
        (1..=count)
            .map(|i| {
                let key_pair = MemberKeyPair::generate(&mut OsRng);
                (index(i), key_pair.sign(hash).unwrap())
            })
            .collect()
    }

    #[tokio::test]
    async fn test_connect_registers_seed_group() {
        let chain = LocalChain::connect(RelayConfig::default()).unwrap();
        assert_eq!(chain.number_of_groups().await, 1);
        assert!(chain.is_group_registered(SEED_GROUP_PUBLIC_KEY).await);
        assert!(chain.last_dkg_result().await.is_none());
    }

    #[test]
    fn test_connect_rejects_invalid_config() {
        assert!(matches!(
            LocalChain::connect(RelayConfig::new(3, 4)),
            Err(ChainError::Config(_))
        ));
    }

    #[test]
    fn test_result_hash_matches_trait() {
        let chain = LocalChain::connect(RelayConfig::default()).unwrap();
        let result = DkgResult::new(vec![10], vec![]);

        let direct = chain.calculate_result_hash(&result).unwrap();
        let via_trait = ResultHasher::calculate_result_hash(&chain, &result).unwrap();
        assert_eq!(direct, via_trait);
    }

    #[tokio::test]
    async fn test_submit_below_threshold_fails() {
        let chain = LocalChain::connect(RelayConfig::new(5, 3)).unwrap();
        let result = DkgResult::new(vec![10], vec![]);
        let hash = chain.calculate_result_hash(&result).unwrap();

        let err = chain
            .submit_dkg_result(index(1), result, signatures(2, &hash))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::InsufficientSignatures {
                got: 2,
                threshold: 3
            }
        ));
        assert!(chain.last_dkg_result().await.is_none());
        assert_eq!(chain.number_of_groups().await, 1);
    }

    #[tokio::test]
    async fn test_submit_unknown_submitter_fails() {
        let chain = LocalChain::connect(RelayConfig::new(3, 2)).unwrap();
        let result = DkgResult::new(vec![10], vec![]);
        let hash = chain.calculate_result_hash(&result).unwrap();

        assert!(matches!(
            chain
                .submit_dkg_result(index(4), result, signatures(3, &hash))
                .await,
            Err(ChainError::UnknownSubmitter { index: 4, .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_records_and_publishes() {
        let chain = LocalChain::connect(RelayConfig::new(5, 3)).unwrap();
        let mut submissions = chain.on_dkg_result_submitted();
        let mut registrations = chain.on_group_registered();
        chain.mine_blocks(7).await;

        let result = DkgResult::new(vec![0xab; 4], vec![index(5)]);
        let hash = chain.calculate_result_hash(&result).unwrap();
        let sigs = signatures(3, &hash);

        let submission = chain
            .submit_dkg_result(index(2), result.clone(), sigs.clone())
            .await
            .unwrap();
        assert_eq!(submission.member_index, index(2));
        assert_eq!(submission.block_number, 7);
        assert_eq!(submission.misbehaved, vec![index(5)]);

        let recorded = chain.last_dkg_result().await.unwrap();
        assert_eq!(recorded.result, result);
        assert_eq!(recorded.signatures, sigs);

        assert!(chain.is_group_registered(&[0xab; 4]).await);
        assert_eq!(chain.number_of_groups().await, 2);
        assert_eq!(chain.current_block().await, 8);

        assert_eq!(submissions.recv().await.unwrap(), submission);
        let registration = registrations.recv().await.unwrap();
        assert_eq!(registration.group_public_key, vec![0xab; 4]);
        assert_eq!(registration.block_number, 7);
    }
}
