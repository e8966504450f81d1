//! In-process result-signing phase
//!
//! Every member runs on its own tokio task and owns its signing state. The
//! tasks share nothing but a broadcast channel standing in for the group
//! transport; each hands its outcome back through its join handle. Member 1
//! submits its result to the chain once every task has finished.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use beacon_chain::{ChainError, DkgResultSubmission, LocalChain};
use beacon_core::{DkgResult, MemberKeyPair, ParticipantIndex, ResultHash, Signature};
use beacon_resultsig::{
    Accusations, DkgResultHashSignatureMessage, ResultSigningError, ResultSigningMember, Roster,
};

/// Errors raised while running a simulation
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Result signing error: {0}")]
    Signing(#[from] ResultSigningError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Member task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Invalid simulation: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Member behaviour for one run
#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    /// Group public key of the result every honest member computes
    pub group_public_key: Vec<u8>,

    /// Members that broadcast a second signature over a competing result
    pub equivocators: BTreeSet<ParticipantIndex>,

    /// Members that computed, and sign, a competing result
    pub dissenters: BTreeSet<ParticipantIndex>,

    /// How long each member waits for its peers' messages
    pub phase_timeout: Duration,
}

impl SimulationConfig {
    pub fn new(group_public_key: Vec<u8>) -> Self {
        Self {
            group_public_key,
            phase_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }

    /// The result honest members agree on
    pub fn result(&self) -> DkgResult {
        DkgResult::new(self.group_public_key.clone(), Vec::new())
    }

    /// The competing result dissenters sign and equivocators add
    pub fn competing_result(&self) -> DkgResult {
        let mut group_public_key = self.group_public_key.clone();
        group_public_key.push(0xff);
        DkgResult::new(group_public_key, Vec::new())
    }
}

/// What one member ended the phase with
#[derive(Debug, Clone)]
pub struct MemberOutcome {
    pub index: ParticipantIndex,
    pub preferred_result_hash: ResultHash,
    pub accusations: Accusations,
    pub signatures: BTreeMap<ParticipantIndex, Signature>,
}

/// Summary of a simulation run
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub result_hash: ResultHash,
    pub outcomes: Vec<MemberOutcome>,
    pub submission: DkgResultSubmission,
}

impl SimulationReport {
    /// Members accused by at least one peer
    pub fn accused(&self) -> BTreeSet<ParticipantIndex> {
        self.outcomes
            .iter()
            .flat_map(|outcome| outcome.accusations.keys().copied())
            .collect()
    }
}

/// Run one result-signing phase against `chain`
pub async fn run(chain: Arc<LocalChain>, config: SimulationConfig) -> Result<SimulationReport> {
    let group_size = chain.config().group_size;
    for index in config.equivocators.iter().chain(&config.dissenters) {
        if index.get() > group_size {
            return Err(SimulationError::Invalid(format!(
                "member {} is outside a group of {}",
                index, group_size
            )));
        }
    }

    let key_pairs: Vec<MemberKeyPair> = (0..group_size)
        .map(|_| MemberKeyPair::generate(&mut OsRng))
        .collect();
    let keys: BTreeMap<_, _> = ParticipantIndex::all(group_size)
        .zip(&key_pairs)
        .map(|(index, key_pair)| (index, *key_pair.public_key()))
        .collect();

    // Every member sees every message, its own included
    let expected_messages = usize::from(group_size) + config.equivocators.len();
    let (transport, _) = broadcast::channel(expected_messages.max(1));

    info!(
        "Starting result signing for a group of {} ({} equivocating, {} dissenting)",
        group_size,
        config.equivocators.len(),
        config.dissenters.len()
    );

    // All inboxes subscribe before any member broadcasts
    let mut tasks = Vec::with_capacity(usize::from(group_size));
    for (index, key_pair) in ParticipantIndex::all(group_size).zip(key_pairs) {
        let roster = Roster::peers_of(index, &keys);
        let member = ResultSigningMember::new(index, key_pair, roster, Arc::clone(&chain))?;
        let task = MemberTask {
            member,
            result: if config.dissenters.contains(&index) {
                config.competing_result()
            } else {
                config.result()
            },
            chain: Arc::clone(&chain),
            equivocation: config
                .equivocators
                .contains(&index)
                .then(|| config.competing_result()),
            transport: transport.clone(),
            inbox: transport.subscribe(),
            expected_messages,
            phase_timeout: config.phase_timeout,
        };
        tasks.push(task);
    }
    drop(transport);

    let handles: Vec<JoinHandle<Result<MemberOutcome>>> = tasks
        .into_iter()
        .map(|task| tokio::spawn(task.run()))
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await??);
    }

    let Some(submitter) = outcomes.first() else {
        return Err(SimulationError::Invalid("empty group".to_string()));
    };
    let result = if config.dissenters.contains(&submitter.index) {
        config.competing_result()
    } else {
        config.result()
    };
    let result_hash = submitter.preferred_result_hash;
    let submission = chain
        .submit_dkg_result(submitter.index, result, submitter.signatures.clone())
        .await?;

    Ok(SimulationReport {
        result_hash,
        outcomes,
        submission,
    })
}

/// A member and its view of the transport
struct MemberTask {
    member: ResultSigningMember<Arc<LocalChain>>,
    chain: Arc<LocalChain>,
    result: DkgResult,
    equivocation: Option<DkgResult>,
    transport: broadcast::Sender<DkgResultHashSignatureMessage>,
    inbox: broadcast::Receiver<DkgResultHashSignatureMessage>,
    expected_messages: usize,
    phase_timeout: Duration,
}

impl MemberTask {
    async fn run(mut self) -> Result<MemberOutcome> {
        let index = self.member.index();
        let message = self.member.sign_dkg_result(&self.result)?;
        self.broadcast(message);

        if let Some(competing) = self.equivocation.take() {
            let hash = self.chain.calculate_result_hash(&competing)?;
            let signature = self.member.sign(&hash)?;
            warn!("Member {} equivocates with a second signature", index);
            self.broadcast(DkgResultHashSignatureMessage::new(index, hash, signature));
        }

        let received = self.collect().await;
        let accusations = self.member.verify_dkg_result_signatures(&received)?;
        let preferred_result_hash = self
            .member
            .preferred_result_hash()
            .ok_or(ResultSigningError::NotSigned(index))?;

        Ok(MemberOutcome {
            index,
            preferred_result_hash,
            accusations,
            signatures: self.member.into_signatures(),
        })
    }

    fn broadcast(&self, message: DkgResultHashSignatureMessage) {
        if self.transport.send(message).is_err() {
            warn!("Member {} broadcast with no listeners", self.member.index());
        }
    }

    /// Peer messages received before every expected message arrived or the
    /// phase timed out
    async fn collect(&mut self) -> Vec<DkgResultHashSignatureMessage> {
        let index = self.member.index();
        let deadline = tokio::time::Instant::now() + self.phase_timeout;
        let mut received = Vec::new();
        let mut seen = 0;

        while seen < self.expected_messages {
            match tokio::time::timeout_at(deadline, self.inbox.recv()).await {
                Ok(Ok(message)) => {
                    seen += 1;
                    if message.sender_index() != index {
                        received.push(message);
                    }
                }
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    warn!("Member {} missed {} messages", index, skipped);
                    seen += usize::try_from(skipped).unwrap_or(usize::MAX);
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => break,
                Err(_) => {
                    warn!(
                        "Member {} timed out with {} of {} messages",
                        index, seen, self.expected_messages
                    );
                    break;
                }
            }
        }

        debug!("Member {} received {} peer messages", index, received.len());
        received
    }
}
